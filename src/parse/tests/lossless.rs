//! The parser produces a lossless tree: writing it back out reproduces the
//! input byte-for-byte, no matter how broken the input was.

use proptest::{prop_assert_eq, proptest};

use super::with_parse;

proptest! {
    #[test]
    fn renders_the_same(s in r".*") {
        with_parse(&s, |tree, _| {
            prop_assert_eq!(&s, &tree.root.write());
            Ok(())
        })?;
    }

    #[test]
    fn renders_the_same_with_sv_flavor(s in r"(module|endmodule|begin|end|if|for|[a-z(),;=#%.]| |\n){0,40}") {
        with_parse(&s, |tree, _| {
            prop_assert_eq!(&s, &tree.root.write());
            Ok(())
        })?;
    }
}

#[test]
fn renders_clean_input() {
    let text = "module top #(parameter N = 4) (clk, rst);
  // counters
  for (genvar i = 0; i < N; i++) begin : g
    M #(.W(i)) m(clk);
  end
endmodule
";
    with_parse(text, |tree, errors| {
        assert!(errors.is_perfect());
        assert_eq!(text, tree.root.write());
    })
}

#[test]
fn renders_skipped_junk() {
    let text = "module m; ??? $$$ endmodule trailing";
    with_parse(text, |tree, _| {
        assert_eq!(text, tree.root.write());
    })
}

#[test]
fn renders_unterminated_block_comment() {
    let text = "module m; /* never closed";
    with_parse(text, |tree, _| {
        assert_eq!(text, tree.root.write());
    })
}

#[test]
fn renders_directives_and_comments() {
    let text = "`default_nettype none\nmodule m; endmodule // done\n";
    with_parse(text, |tree, errors| {
        assert!(errors.is_perfect());
        assert_eq!(text, tree.root.write());
    })
}

#[test]
fn renders_eof_inside_a_list() {
    let text = "module m #(parameter N = ";
    with_parse(text, |tree, _| {
        assert_eq!(text, tree.root.write());
    })
}
