mod lexing;
mod lossless;
mod recovery;

use bumpalo::Bump;

use super::cst::{Node, SyntaxKind, SyntaxNode};
use super::{parse, SyntaxTree};
use crate::errors::Errors;
use crate::source::Sources;

fn with_parse<T>(text: &str, f: impl FnOnce(&SyntaxTree, &Errors) -> T) -> T {
    let _ = pretty_env_logger::try_init();

    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add(text);

    let mut errors = Errors::new();
    let tree = parse(&alloc, &mut errors, sources.get(id));
    f(&tree, &errors)
}

fn top_members<'a>(tree: &SyntaxTree<'a>) -> &'a [&'a SyntaxNode<'a>] {
    match &tree.root.node {
        Node::SourceText { members, .. } => members,
        _ => panic!("the parse entry point always produces a source text node"),
    }
}

#[test]
fn module_declaration_shape() {
    with_parse("module m #(parameter N = 1) (a, b); endmodule", |tree, errors| {
        assert!(errors.is_perfect());

        let members = top_members(tree);
        assert_eq!(1, members.len());
        assert_eq!(SyntaxKind::ModuleDeclaration, members[0].kind());

        let Node::ModuleDeclaration { keyword, name, parameter_ports, ports, .. } =
            &members[0].node
        else {
            unreachable!();
        };

        assert_eq!("module", keyword.text);
        assert_eq!("m", name.text);
        assert!(parameter_ports.is_some());
        assert!(ports.is_some());
    })
}

#[test]
fn instantiation_shape() {
    with_parse("module top; M #(.N(4), 8) u1(a), u2(); endmodule", |tree, errors| {
        assert!(errors.is_perfect());

        let members = top_members(tree);
        let Node::ModuleDeclaration { members, .. } = &members[0].node else { unreachable!() };
        assert_eq!(1, members.len());

        let Node::HierarchyInstantiation { type_name, parameters, instances, .. } =
            &members[0].node
        else {
            panic!("expected an instantiation, got {:?}", members[0].kind());
        };

        assert_eq!("M", type_name.text);
        assert!(parameters.is_some());

        let names: Vec<_> = instances
            .iter()
            .filter_map(|element| match element {
                super::cst::TokenOrSyntax::Node(node) => match &node.node {
                    Node::HierarchicalInstance { name, .. } => Some(name.text),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(vec!["u1", "u2"], names);
    })
}

#[test]
fn generate_constructs_parse() {
    let text = "module top;
  generate
    if (1) begin : g
      M m();
    end else begin end
    for (genvar i = 0; i < 4; i++) begin : loop
      M m();
    end
  endgenerate
endmodule";

    with_parse(text, |tree, errors| {
        assert!(errors.is_perfect(), "unexpected diagnostics: {:?}", errors.iter().next());

        let members = top_members(tree);
        let Node::ModuleDeclaration { members, .. } = &members[0].node else { unreachable!() };
        assert_eq!(SyntaxKind::GenerateRegion, members[0].kind());

        let Node::GenerateRegion { members, .. } = &members[0].node else { unreachable!() };
        assert_eq!(SyntaxKind::IfGenerate, members[0].kind());
        assert_eq!(SyntaxKind::LoopGenerate, members[1].kind());
    })
}

#[test]
fn procedural_blocks_parse() {
    let text = "module top;
  initial begin : setup q = 1; end
  always_ff begin q <= d; end
  final ;
endmodule";

    with_parse(text, |tree, errors| {
        assert!(errors.is_perfect());

        let members = top_members(tree);
        let Node::ModuleDeclaration { members, .. } = &members[0].node else { unreachable!() };

        let kinds: Vec<_> = members.iter().map(|member| member.kind()).collect();
        assert_eq!(
            vec![
                SyntaxKind::ProceduralBlock,
                SyntaxKind::ProceduralBlock,
                SyntaxKind::ProceduralBlock
            ],
            kinds
        );

        let Node::ProceduralBlock { statement, .. } = &members[0].node else { unreachable!() };
        let Node::BlockStatement { label, statements, .. } = &statement.node else {
            panic!("expected a labeled block, got {:?}", statement.kind());
        };
        assert_eq!("setup", label.as_ref().unwrap().name.text);
        assert_eq!(1, statements.len());
    })
}

#[test]
fn missing_tokens_keep_the_tree_complete() {
    with_parse("module m", |tree, errors| {
        assert!(!errors.is_perfect());

        let members = top_members(tree);
        let Node::ModuleDeclaration { semi, end_keyword, .. } = &members[0].node else {
            unreachable!();
        };

        assert!(semi.missing);
        assert!(end_keyword.missing);
    })
}
