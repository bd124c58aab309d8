use crate::{Location, Node, Top, tokens};

tokens! {
    Calc = "calculation" [symtab];
    Assign = "assign" [lookup];
    Output = "output";
    Ident = "ident" [print];
    Int = "int" [print];
    Str = "string" [print];
    Expr = "expression";
}

#[test]
fn leaf_nodes_print_netstring_locations() {
    let node = Assign << (Ident ^ "x") << (Expr << (Int ^ "42"));

    insta::assert_snapshot!(node.to_string(), @r"
    (assign
      (ident 1:x)
      (expression
        (int 2:42)))
    ");
}

#[test]
fn unprinted_tokens_omit_locations() {
    let node = Node::with_location(Expr, Location::synthetic("1 + 2"));
    insta::assert_snapshot!(node.to_string(), @"(expression)");
}

#[test]
fn symtab_renders_as_block() {
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());

    let assign = Assign << (Ident ^ "x") << (Expr << (Int ^ "1"));
    calc.push_back(assign.clone());
    assign.bind(&Location::synthetic("x"));

    insta::assert_snapshot!(calc.to_string(), @r"
    (calculation
      {
        x = assign}
      (assign
        (ident 1:x)
        (expression
          (int 1:1))))
    ");
}

#[test]
fn multiple_definitions_list_vertically() {
    let top = Node::new(Top);
    let calc = Node::new(Calc);
    top.push_back(calc.clone());

    for _ in 0..2 {
        let assign = Assign << (Ident ^ "x");
        calc.push_back(assign.clone());
        assign.bind(&Location::synthetic("x"));
    }

    let output = Output ^ "out";
    calc.push_back(output.clone());
    output.include();

    insta::assert_snapshot!(calc.to_string(), @r"
    (calculation
      {
        x =
          assign
          assign
        include out}
      (assign
        (ident 1:x))
      (assign
        (ident 1:x))
      (output))
    ");
}

#[test]
fn netstring_length_counts_bytes() {
    let node = Str ^ "a\"b c";
    insta::assert_snapshot!(node.to_string(), @r#"(string 5:a"b c)"#);
}
