use bumpalo::Bump;

use crate::errors::Errors;
use crate::parse::parse;
use crate::source::Sources;

use super::scope::{LookupLocation, ScopeId};
use super::symbols::{ProceduralBlockKind, SymbolData, SymbolId, SymbolKind};
use super::{Compilation, CompilationOptions};

fn compile<T>(text: &str, f: impl FnOnce(&Compilation, &Errors) -> T) -> T {
    compile_with(text, CompilationOptions::default(), f)
}

fn compile_with<T>(
    text: &str,
    options: CompilationOptions,
    f: impl FnOnce(&Compilation, &Errors) -> T,
) -> T {
    let _ = pretty_env_logger::try_init();

    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add(text);

    let mut errors = Errors::new();
    let tree = parse(&alloc, &mut errors, sources.get(id));

    let mut comp = Compilation::new(options);
    comp.add_unit(&tree);
    comp.elaborate(&mut errors);

    f(&comp, &errors)
}

/// The scope owned by the only top-level instance.
fn top_scope(comp: &Compilation) -> ScopeId {
    let root = comp.symbol(comp.root());
    let SymbolData::Root { top_instances, .. } = &root.data else { unreachable!() };
    assert_eq!(1, top_instances.len(), "expected exactly one top instance");
    comp.symbol(top_instances[0]).scope.expect("instances are scopes")
}

fn member_kinds(comp: &Compilation, scope: ScopeId) -> Vec<SymbolKind> {
    comp.scope(scope).members().iter().map(|&member| comp.symbol(member).kind).collect()
}

fn parameter_value(comp: &Compilation, scope: ScopeId, name: &str) -> Option<i64> {
    let found = comp.find(scope, name)?;
    comp.symbol(found).parameter_value().map(|value| value.as_int())
}

#[test]
fn lone_module_becomes_the_top_instance() {
    compile("module top; endmodule", |comp, errors| {
        assert!(errors.is_perfect());

        let root = comp.symbol(comp.root());
        assert_eq!(SymbolKind::Root, root.kind);
        assert_eq!("$root", comp.symbol_name(comp.root()));

        let SymbolData::Root { top_instances, compilation_units } = &root.data else {
            unreachable!();
        };
        assert_eq!(1, compilation_units.len());
        assert_eq!(1, top_instances.len());

        let top = comp.symbol(top_instances[0]);
        assert_eq!(SymbolKind::ModuleInstance, top.kind);
        assert_eq!("top", comp.symbol_name(top_instances[0]));
    })
}

#[test]
fn instantiated_modules_are_not_tops() {
    let text = "module M; endmodule
module top; M m1(); M m2(); endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        assert_eq!("top", comp.symbol_name(comp.scope(scope).owner));

        let kinds = member_kinds(comp, scope);
        assert_eq!(vec![SymbolKind::ModuleInstance, SymbolKind::ModuleInstance], kinds);

        let m1 = comp.find(scope, "m1").expect("m1 is a member of top");
        let m2 = comp.find(scope, "m2").expect("m2 is a member of top");
        assert_ne!(m1, m2);
    })
}

#[test]
fn parameters_with_overrides() {
    let text = "module M #(parameter N = 1, localparam L = N + 1);
  parameter P = N * 2;
endmodule
module top;
  M #(.N(4)) u();
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let u = comp.find(scope, "u").expect("u is a member of top");
        let u_scope = comp.symbol(u).scope.unwrap();

        assert_eq!(Some(4), parameter_value(comp, u_scope, "N"));
        assert_eq!(Some(5), parameter_value(comp, u_scope, "L"));
        assert_eq!(Some(8), parameter_value(comp, u_scope, "P"));
    })
}

#[test]
fn ordered_overrides_match_header_parameters() {
    let text = "module M #(parameter A = 1, parameter B = 2); endmodule
module top; M #(7, 9) u(); endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let u_scope = comp.symbol(comp.find(scope, "u").unwrap()).scope.unwrap();

        assert_eq!(Some(7), parameter_value(comp, u_scope, "A"));
        assert_eq!(Some(9), parameter_value(comp, u_scope, "B"));
    })
}

#[test]
fn local_parameters_reject_overrides() {
    let text = "module M #(localparam L = 3); endmodule
module top; M #(.L(9)) u(); endmodule";

    compile(text, |comp, errors| {
        assert_eq!(1, errors.num_errors());

        let scope = top_scope(comp);
        let u_scope = comp.symbol(comp.find(scope, "u").unwrap()).scope.unwrap();

        // The default survives.
        assert_eq!(Some(3), parameter_value(comp, u_scope, "L"));
    })
}

#[test]
fn unknown_module_keeps_siblings() {
    let text = "module M; endmodule
module top; Nope n(); M m(); endmodule";

    compile(text, |comp, errors| {
        assert_eq!(1, errors.num_errors());

        let scope = top_scope(comp);
        assert!(comp.find(scope, "n").is_none());
        assert!(comp.find(scope, "m").is_some());
    })
}

#[test]
fn false_if_generate_without_else_adds_nothing() {
    compile("module top; if (0) begin M m(); end endmodule", |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        assert!(comp.scope(scope).members().is_empty());
    })
}

#[test]
fn true_if_generate_builds_the_labeled_branch() {
    let text = "module top;
  if (1 + 1 == 2) begin : g
    parameter p = 2;
  end else begin : h
    parameter q = 3;
  end
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        assert_eq!(vec![SymbolKind::GenerateBlock], member_kinds(comp, scope));

        let g = comp.find(scope, "g").expect("the then-branch is named g");
        assert!(comp.find(scope, "h").is_none());

        let g_scope = comp.symbol(g).scope.unwrap();
        assert_eq!(Some(2), parameter_value(comp, g_scope, "p"));
    })
}

#[test]
fn else_branch_wins_when_the_guard_is_false() {
    let text = "module top;
  if (0) begin : g end
  else if (1) begin : h parameter q = 3; end
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let h = comp.find(scope, "h").expect("the else-if branch is named h");
        let h_scope = comp.symbol(h).scope.unwrap();
        assert_eq!(Some(3), parameter_value(comp, h_scope, "q"));
    })
}

#[test]
fn loop_generate_expands_per_iteration() {
    let text = "module M; endmodule
module top;
  for (genvar i = 0; i < 3; i++) begin : g
    M m();
  end
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let array = comp.find(scope, "g").expect("the array takes the block label");
        assert_eq!(SymbolKind::GenerateBlockArray, comp.symbol(array).kind);

        let array_scope = comp.symbol(array).scope.unwrap();
        let children = comp.scope(array_scope).members();
        assert_eq!(3, children.len());

        for (index, &child) in children.iter().enumerate() {
            assert_eq!(SymbolKind::GenerateBlock, comp.symbol(child).kind);

            let child_scope = comp.symbol(child).scope.unwrap();
            let kinds = member_kinds(comp, child_scope);
            assert_eq!(vec![SymbolKind::Parameter, SymbolKind::ModuleInstance], kinds);

            assert_eq!(Some(index as i64), parameter_value(comp, child_scope, "i"));

            let m = comp.find(child_scope, "m").expect("each child holds an instance of M");
            assert_eq!(SymbolKind::ModuleInstance, comp.symbol(m).kind);
        }
    })
}

#[test]
fn loop_generate_respects_the_iteration_cap() {
    let options =
        CompilationOptions { max_generate_steps: 4, ..CompilationOptions::default() };

    compile_with("module top; for (genvar i = 0; 1; i++) ; endmodule", options, |comp, errors| {
        assert_eq!(1, errors.num_errors());

        let scope = top_scope(comp);
        let members = comp.scope(scope).members();
        assert_eq!(1, members.len());

        let array_scope = comp.symbol(members[0]).scope.unwrap();
        assert_eq!(4, comp.scope(array_scope).members().len());
    })
}

#[test]
fn duplicate_declarations_keep_the_first() {
    let text = "module top;
  parameter x = 1;
  parameter x = 2;
endmodule";

    compile(text, |comp, errors| {
        assert_eq!(1, errors.num_errors());

        let scope = top_scope(comp);

        // Both stay in member order.
        assert_eq!(2, comp.scope(scope).members().len());

        // The index keeps the first.
        assert_eq!(Some(1), parameter_value(comp, scope, "x"));
    })
}

#[test]
fn lookup_respects_declaration_order() {
    let text = "module top;
  parameter a = 1;
  parameter b = 2;
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let a = comp.find(scope, "a").unwrap();
        let b = comp.find(scope, "b").unwrap();

        // From the very start of the scope nothing is visible yet.
        assert_eq!(None, comp.lookup("a", LookupLocation::start(scope)));

        // From past the end everything is.
        assert_eq!(Some(a), comp.lookup("a", LookupLocation::max(scope)));
        assert_eq!(Some(b), comp.lookup("b", LookupLocation::max(scope)));

        // From just before `b`, `a` is visible and `b` is not.
        let before_b = comp.location_before(b).unwrap();
        assert_eq!(Some(a), comp.lookup("a", before_b));
        assert_eq!(None, comp.lookup("b", before_b));
    })
}

#[test]
fn forward_references_fail_to_evaluate() {
    let text = "module top;
  parameter a = b;
  parameter b = 1;
endmodule";

    compile(text, |comp, errors| {
        assert_eq!(1, errors.num_errors());

        let scope = top_scope(comp);
        assert_eq!(None, parameter_value(comp, scope, "a"));
        assert_eq!(Some(1), parameter_value(comp, scope, "b"));
    })
}

#[test]
fn procedural_and_sequential_blocks() {
    let text = "module top;
  initial begin : outer
    begin : inner q = 1; end
  end
  always_comb ;
endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let kinds = member_kinds(comp, scope);
        assert_eq!(vec![SymbolKind::ProceduralBlock, SymbolKind::ProceduralBlock], kinds);

        let members = comp.scope(scope).members();
        let initial = comp.symbol(members[0]);
        let SymbolData::ProceduralBlock { kind, .. } = &initial.data else { unreachable!() };
        assert_eq!(ProceduralBlockKind::Initial, *kind);

        let outer_scope = comp.symbol(members[0]).scope.unwrap();
        let outer = comp.find(outer_scope, "outer").expect("the labeled block is a member");
        assert_eq!(SymbolKind::SequentialBlock, comp.symbol(outer).kind);

        let inner_scope = comp.symbol(outer).scope.unwrap();
        assert!(comp.find(inner_scope, "inner").is_some());

        let comb = comp.symbol(members[1]);
        let SymbolData::ProceduralBlock { kind, .. } = &comb.data else { unreachable!() };
        assert_eq!(ProceduralBlockKind::AlwaysComb, *kind);
    })
}

#[test]
fn packages_live_in_their_compilation_unit() {
    let text = "package pkg;
  parameter W = 8;
endpackage
module top; endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let root = comp.symbol(comp.root());
        let SymbolData::Root { compilation_units, .. } = &root.data else { unreachable!() };

        let unit_scope = comp.symbol(compilation_units[0]).scope.unwrap();
        let pkg = comp.find(unit_scope, "pkg").expect("the package is a unit member");
        assert_eq!(SymbolKind::Package, comp.symbol(pkg).kind);

        let pkg_scope = comp.symbol(pkg).scope.unwrap();
        assert_eq!(Some(8), parameter_value(comp, pkg_scope, "W"));
    })
}

#[test]
fn explicit_top_selection() {
    let text = "module a; endmodule
module b; endmodule";

    let options = CompilationOptions {
        top_modules: vec!["b".into()],
        ..CompilationOptions::default()
    };

    compile_with(text, options, |comp, errors| {
        assert!(errors.is_perfect());

        let root = comp.symbol(comp.root());
        let SymbolData::Root { top_instances, .. } = &root.data else { unreachable!() };
        assert_eq!(1, top_instances.len());
        assert_eq!("b", comp.symbol_name(top_instances[0]));
    })
}

#[test]
fn recursive_instantiation_hits_the_depth_limit() {
    let options = CompilationOptions {
        top_modules: vec!["a".into()],
        max_instance_depth: 3,
        ..CompilationOptions::default()
    };

    compile_with("module a; a x(); endmodule", options, |comp, errors| {
        assert!(errors.num_errors() >= 1);

        // The chain terminates instead of recursing forever.
        let scope = top_scope(comp);
        let mut depth = 0;
        let mut current = scope;
        while let Some(x) = comp.find(current, "x") {
            current = comp.symbol(x).scope.unwrap();
            depth += 1;
            assert!(depth <= 4);
        }
    })
}

#[test]
fn member_order_tracks_source_order() {
    let text = "module top;
  parameter a = 1;
  M m();
  parameter b = 2;
endmodule
module M; endmodule";

    compile(text, |comp, errors| {
        assert!(errors.is_perfect());

        let scope = top_scope(comp);
        let members = comp.scope(scope).members();

        let mut last = None;
        for (index, &member) in members.iter().enumerate() {
            let symbol = comp.symbol(member);
            assert_eq!(index as u32, symbol.order);
            assert_eq!(Some(scope), symbol.parent);

            let location = symbol.location.expect("module members carry locations");
            if let Some(previous) = last {
                assert!(location.start > previous, "members are in source order");
            }
            last = Some(location.start);
        }
    })
}

#[test]
fn elaboration_is_idempotent() {
    let text = "module M #(parameter N = 2); endmodule
module top;
  for (genvar i = 0; i < 2; i++) begin : g
    M #(.N(i)) m();
  end
endmodule";

    let _ = pretty_env_logger::try_init();

    let alloc = Bump::new();
    let mut sources = Sources::new();
    let id = sources.add(text);

    let mut errors = Errors::new();
    let tree = parse(&alloc, &mut errors, sources.get(id));
    assert!(errors.is_perfect());

    let mut first = Compilation::new(CompilationOptions::default());
    first.add_unit(&tree);
    let mut first_errors = Errors::new();
    first.elaborate(&mut first_errors);

    let mut second = Compilation::new(CompilationOptions::default());
    second.add_unit(&tree);
    let mut second_errors = Errors::new();
    second.elaborate(&mut second_errors);

    assert_eq!(first_errors.num_errors(), second_errors.num_errors());
    assert_isomorphic(&first, first.root(), &second, second.root());
}

fn assert_isomorphic(a: &Compilation, a_id: SymbolId, b: &Compilation, b_id: SymbolId) {
    let (sa, sb) = (a.symbol(a_id), b.symbol(b_id));

    assert_eq!(sa.kind, sb.kind);
    assert_eq!(a.symbol_name(a_id), b.symbol_name(b_id));
    assert_eq!(sa.order, sb.order);

    if let (SymbolData::Parameter { value: va, .. }, SymbolData::Parameter { value: vb, .. }) =
        (&sa.data, &sb.data)
    {
        assert_eq!(va, vb);
    }

    match (sa.scope, sb.scope) {
        (Some(scope_a), Some(scope_b)) => {
            let (ma, mb) = (a.scope(scope_a).members(), b.scope(scope_b).members());
            assert_eq!(ma.len(), mb.len());
            for (&child_a, &child_b) in ma.iter().zip(mb) {
                assert_isomorphic(a, child_a, b, child_b);
            }
        }
        (None, None) => {}
        _ => panic!("scope-ness differs between isomorphic symbols"),
    }
}
