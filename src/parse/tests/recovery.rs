//! Separated-list recovery: skipped source is re-homed as trivia on the
//! closest surviving token, and each junk run costs one diagnostic.

use super::with_parse;
use crate::parse::cst::{Node, SeparatedList, SyntaxNode, Token, TokenOrSyntax, Trivia};

fn port_list<'a>(tree_root: &'a SyntaxNode<'a>) -> &'a SeparatedList<'a> {
    let Node::SourceText { members, .. } = &tree_root.node else { unreachable!() };
    let Node::ModuleDeclaration { ports, .. } = &members[0].node else {
        panic!("expected a module declaration");
    };
    let Node::PortList { list } = &ports.expect("the test module has a port list").node else {
        unreachable!();
    };
    list
}

fn element_tokens<'a>(list: &SeparatedList<'a>) -> Vec<Option<Token<'a>>> {
    list.elements
        .iter()
        .map(|element| match element {
            TokenOrSyntax::Token(token) => Some(*token),
            TokenOrSyntax::Node(_) => None,
        })
        .collect()
}

#[test]
fn empty_list() {
    with_parse("module m(); endmodule", |tree, errors| {
        let list = port_list(tree.root);

        assert!(errors.is_perfect());
        assert!(list.elements.is_empty());
        assert!(!list.open.missing);
        assert!(!list.close.missing);
    })
}

#[test]
fn trailing_separator_synthesizes_the_item() {
    with_parse("module m(a,); endmodule", |tree, errors| {
        let list = port_list(tree.root);

        // item, separator, missing item
        assert_eq!(3, list.elements.len());
        assert_eq!(1, errors.num_errors());

        let Some(TokenOrSyntax::Node(missing)) = list.elements.last() else {
            panic!("the synthesized item is a node");
        };
        let Node::IdentifierExpression(token) = &missing.node else {
            panic!("expected an identifier expression");
        };
        assert!(token.missing);

        assert_eq!("module m(a,); endmodule", tree.root.write());
    })
}

#[test]
fn bad_token_mid_list_is_skipped_once() {
    with_parse("module m(a, %, b); endmodule", |tree, errors| {
        let list = port_list(tree.root);

        // One diagnostic for the whole junk run, anchored at `%`.
        assert_eq!(1, errors.num_errors());
        let (_, error) = errors.iter().next().unwrap();
        assert_eq!("%", {
            let span = error.at;
            &"module m(a, %, b); endmodule"[span.start..span.end]
        });

        // The `%` survives as a skipped-tokens trivium on the separator
        // that restarted the list.
        let tokens = element_tokens(list);
        let second_separator = tokens[3].expect("element 3 is the second separator");
        let skipped = second_separator
            .trivia
            .iter()
            .find_map(|trivium| match trivium {
                Trivia::SkippedTokens(tokens) => Some(tokens),
                _ => None,
            })
            .expect("the separator carries the skipped run");

        assert_eq!(1, skipped.len());
        assert_eq!("%", skipped[0].text);

        assert_eq!("module m(a, %, b); endmodule", tree.root.write());
    })
}

#[test]
fn junk_before_the_first_item() {
    with_parse("module m(%%, a); endmodule", |tree, errors| {
        let list = port_list(tree.root);

        // One diagnostic for the `%%` run, one for the item the run
        // displaced.
        assert_eq!(2, errors.num_errors());

        // The skipped run lands on the first surviving element.
        let has_skipped = list.elements.iter().any(|element| {
            let token = match element {
                TokenOrSyntax::Token(token) => *token,
                TokenOrSyntax::Node(node) => {
                    let Node::IdentifierExpression(token) = &node.node else { return false };
                    *token
                }
            };
            token.trivia.iter().any(|trivium| matches!(trivium, Trivia::SkippedTokens(_)))
        });
        assert!(has_skipped);

        assert_eq!("module m(%%, a); endmodule", tree.root.write());
    })
}

#[test]
fn abort_on_missing_close() {
    with_parse("module m(a, b; endmodule", |tree, errors| {
        let list = port_list(tree.root);

        assert!(list.close.missing);
        assert!(!errors.is_perfect());
        assert_eq!("module m(a, b; endmodule", tree.root.write());
    })
}

#[test]
fn junk_between_members_lands_on_the_next_member() {
    with_parse("module m; 123 456 parameter p = 1; endmodule", |tree, errors| {
        assert_eq!(1, errors.num_errors());

        let Node::SourceText { members, .. } = &tree.root.node else { unreachable!() };
        let Node::ModuleDeclaration { members, .. } = &members[0].node else { unreachable!() };
        assert_eq!(1, members.len());

        let Node::ParameterDeclaration { keyword: Some(keyword), .. } = &members[0].node else {
            panic!("expected the parameter declaration to survive");
        };

        let Some(Trivia::SkippedTokens(skipped)) = keyword.trivia.first() else {
            panic!("the skipped run is the keyword's first trivium");
        };
        assert_eq!(2, skipped.len());

        assert_eq!("module m; 123 456 parameter p = 1; endmodule", tree.root.write());
    })
}
