//! End-to-end tests over whole model documents through the public API:
//! parse, analyze, query and format.

use antimony_core::{
    format, CompletionKind, Context, IssueKind, NodeKind, Position, Scope, SymbolType, Tree,
};

/// A small but complete model touching every statement family.
const GLYCOLYSIS: &str = "\
// glycolysis toy model
unit conc = mole / liter

function mm(v, s, km)
  v * s / (km + s)
end

model *pool(S)
  S -> ; kd*S
  S = 1
  kd = 0.05
end

compartment cell = 1
species glc in cell = 5, g6p in cell = 0
J0: glc -> g6p; mm(vmax, glc, km)
vmax = 10
km = 0.5
P: pool(g6p)
glc identity \"http://identifiers.org/chebi/CHEBI:4167\"
glc is \"Glucose\"
vmax has conc
t = 0
t' = 1
";

/// Every `(scope, name, type)` of the analysis, in table order.
fn symbol_rows(ctx: &Context, src: &str) -> Vec<(String, String, SymbolType)> {
    let analysis = ctx.analyze(src);
    let table = analysis.table();
    table
        .scopes()
        .flat_map(|scope| {
            table
                .scope_symbols(scope)
                .map(move |s| (scope.to_string(), s.name.clone(), s.typ))
        })
        .collect()
}

fn leaf_kinds_and_text(tree: &Tree) -> Vec<(NodeKind, String)> {
    tree.leaves()
        .map(|id| (tree.kind(id), tree.text(id).to_string()))
        .collect()
}

// ──────────────────────────────────────────────
// Parsing
// ──────────────────────────────────────────────

#[test]
fn leaf_chain_round_trips_any_input() {
    let ctx = Context::new();
    let inputs = [
        "",
        "\n",
        "\n\n\n",
        GLYCOLYSIS,
        "%%% ^^^ ;;; )))",
        "a = \"unterminated",
        "/* never closed",
        "model m\n  a = 1\n",
        "end end end",
        "J0: -> ; ",
        "\ta\t=\t1\t# tabs\r\n",
        "α = 1\nβ -> γ; 2",
        "function f(\nmodel *m(\n",
    ];
    for src in inputs {
        let tree = ctx.parse(src);
        assert_eq!(tree.source(), format!("{}\n", src), "input {:?}", src);
    }
}

#[test]
fn analysis_and_queries_never_panic_on_garbage() {
    let ctx = Context::new();
    let src = "J1: A + -> ; \nmodel *m(\nx = f(1,,2)\n\"s\" is is\nend";
    let analysis = ctx.analyze(src);
    assert!(analysis.has_errors());
    for line in 1..=6 {
        for column in 1..=20 {
            let pos = Position::new(line, column);
            let _ = analysis.symbols_at(pos);
            let _ = analysis.goto(pos, "garbage.ant");
            let _ = ctx.completions(&analysis, pos);
        }
    }
}

#[test]
fn malformed_statement_is_isolated() {
    let ctx = Context::new();
    let broken = GLYCOLYSIS.replace("km = 0.5\n", "km = 0.5\nb = )\n");
    let analysis = ctx.analyze(&broken);
    let issues = analysis.get_issues();
    assert_eq!(issues.len(), 1, "{:?}", issues);
    assert_eq!(issues[0].kind, IssueKind::UnexpectedToken);
    assert_eq!(issues[0].range.start, Position::new(19, 5));

    // everything else analyzes exactly as before
    assert_eq!(symbol_rows(&ctx, &broken), symbol_rows(&ctx, GLYCOLYSIS));
}

#[test]
fn strict_parse_accepts_valid_model() {
    let ctx = Context::new();
    let tree = ctx.parse_strict(GLYCOLYSIS).expect("valid model");
    assert_eq!(tree.kind(tree.root()), NodeKind::FileNode);
    let err = ctx.parse_strict("a = 1\nb = )").unwrap_err();
    assert_eq!(err.text, ")");
    assert_eq!(err.pos, Position::new(2, 5));
}

// ──────────────────────────────────────────────
// Analysis
// ──────────────────────────────────────────────

#[test]
fn complete_model_is_clean() {
    let ctx = Context::new();
    let analysis = ctx.analyze(GLYCOLYSIS);
    assert!(analysis.get_issues().is_empty(), "{:?}", analysis.get_issues());

    let table = analysis.table();
    let typ = |n: &str| table.lookup(&Scope::Global, n).map(|s| s.typ);
    assert_eq!(typ("conc"), Some(SymbolType::Unit));
    assert_eq!(typ("mm"), Some(SymbolType::Function));
    assert_eq!(typ("pool"), Some(SymbolType::ModularModel));
    assert_eq!(typ("cell"), Some(SymbolType::Compartment));
    assert_eq!(typ("glc"), Some(SymbolType::Species));
    assert_eq!(typ("J0"), Some(SymbolType::Reaction));
    assert_eq!(typ("vmax"), Some(SymbolType::Parameter));
    assert_eq!(typ("P"), Some(SymbolType::Submodel));

    let glc = table.lookup(&Scope::Global, "glc").expect("glc");
    assert_eq!(glc.compartment.as_deref(), Some("cell"));
    assert_eq!(glc.display_name.as_deref(), Some("Glucose"));
    assert_eq!(glc.annotations.len(), 1);
    assert!(glc.in_reaction);

    let t = table.lookup(&Scope::Global, "t").expect("t");
    assert_eq!(t.rate_rule.as_deref(), Some("1"));

    let pool_s = table
        .lookup(&Scope::Module("pool".into()), "S")
        .expect("module species");
    assert_eq!(pool_s.typ, SymbolType::Species);
}

#[test]
fn forward_references_resolve_in_second_pass() {
    let ctx = Context::new();
    let analysis = ctx.analyze("x is \"Ex\"\nx' = y\nx = 1\ny = 2");
    assert!(analysis.get_issues().is_empty(), "{:?}", analysis.get_issues());
    let x = analysis
        .table()
        .lookup(&Scope::Global, "x")
        .expect("x");
    assert_eq!(x.display_name.as_deref(), Some("Ex"));
    assert_eq!(x.rate_rule.as_deref(), Some("y"));
}

#[test]
fn type_conflicts_across_statement_kinds() {
    let ctx = Context::new();
    let analysis = ctx.analyze("J0: A -> B; 1\nA = 1\nB = 1\ncompartment A");
    let incompatible: Vec<_> = analysis
        .get_issues()
        .into_iter()
        .filter(|i| i.kind == IssueKind::IncompatibleType)
        .collect();
    assert_eq!(incompatible.len(), 2);
    // the new site first, then the site that set the type
    assert_eq!(incompatible[0].range.start.line, 4);
    assert_eq!(incompatible[1].range.start.line, 1);
    // the first type wins
    let a = analysis.table().lookup(&Scope::Global, "A").expect("A");
    assert_eq!(a.typ, SymbolType::Species);
}

#[test]
fn redefined_function_is_reported_at_both_sites() {
    let ctx = Context::new();
    let analysis = ctx.analyze("function f(x)\n  x\nend\nfunction f(y)\n  y\nend");
    let lines: Vec<u32> = analysis
        .get_issues()
        .iter()
        .filter(|i| i.kind == IssueKind::RedefinedFunction)
        .map(|i| i.range.start.line)
        .collect();
    // once for the global copy, once for the function's own scope
    assert_eq!(lines, vec![1, 4, 1, 4]);
}

// ──────────────────────────────────────────────
// Queries
// ──────────────────────────────────────────────

#[test]
fn hover_text_carries_value_display_name_and_annotation() {
    let ctx = Context::new();
    let analysis = ctx.analyze(GLYCOLYSIS);
    let (symbols, range) = analysis.symbols_at(Position::new(16, 5));
    assert_eq!(symbols.len(), 1);
    assert_eq!(range.map(|r| (r.start.column, r.end.column)), Some((5, 8)));
    assert_eq!(
        symbols[0].help_str(analysis.tree()),
        "```\n(species) glc\nInitialized Value: 5\n```\n\n***\n\nGlucose\n\n***\n\nhttp://identifiers.org/chebi/CHEBI:4167"
    );

    let (vmax, _) = analysis.symbols_at(Position::new(17, 1));
    assert_eq!(
        vmax[0].help_str(analysis.tree()),
        "```\n(parameter) vmax\nInitialized Value: 10 (conc)\n```"
    );
}

#[test]
fn goto_jumps_from_use_to_value() {
    let ctx = Context::new();
    let analysis = ctx.analyze(GLYCOLYSIS);
    let locs = analysis.goto(Position::new(16, 21), "glycolysis.ant");
    assert_eq!(locs.len(), 1);
    assert_eq!(locs[0].path, "glycolysis.ant");
    assert_eq!(locs[0].range.start, Position::new(17, 1));
    assert_eq!(locs[0].range.end, Position::new(17, 10));
}

#[test]
fn outline_lists_blocks_and_named_reactions() {
    let ctx = Context::new();
    let analysis = ctx.analyze(GLYCOLYSIS);
    let outline: Vec<(String, SymbolType)> = analysis
        .outline()
        .into_iter()
        .map(|item| (item.name, item.kind))
        .collect();
    assert_eq!(
        outline,
        vec![
            ("mm".to_string(), SymbolType::Function),
            ("pool".to_string(), SymbolType::ModularModel),
            ("J0".to_string(), SymbolType::Reaction),
        ]
    );
}

#[test]
fn rate_law_snippet_after_edit() {
    let ctx = Context::new();
    let src = format!("{}J1: 2 glc => g6p; ", GLYCOLYSIS);
    let analysis = ctx.analyze(&src);
    let snippets: Vec<String> = ctx
        .completions(&analysis, Position::new(25, 19))
        .into_iter()
        .filter(|c| c.kind == CompletionKind::RateLaw)
        .map(|c| c.text)
        .collect();
    assert_eq!(
        snippets,
        vec!["${1:k_f_J1} * glc^2 - ${2:k_b_J1} * g6p".to_string()]
    );
}

#[test]
fn anonymous_reaction_snippet_gets_a_fresh_name() {
    let ctx = Context::new();
    let src = "J0: A -> B; k*A\nk = 1\nA = 1\nB = 1\nC -> D; ";
    let analysis = ctx.analyze(src);
    let snippet = ctx
        .completions(&analysis, Position::new(5, 9))
        .into_iter()
        .find(|c| c.kind == CompletionKind::RateLaw)
        .expect("snippet");
    assert_eq!(snippet.text, "${1:k_f_J1} * C");
}

// ──────────────────────────────────────────────
// Formatting
// ──────────────────────────────────────────────

#[test]
fn formatting_changes_only_whitespace() {
    let ctx = Context::new();
    let original = ctx.parse(GLYCOLYSIS);
    let formatted = format(&original);
    let reparsed = ctx.parse(&formatted);
    assert_eq!(leaf_kinds_and_text(&original), leaf_kinds_and_text(&reparsed));
    assert!(formatted.starts_with("// glycolysis toy model\n"));
    assert!(formatted.contains("\nJ0: glc -> g6p; mm(vmax, glc, km)\n"));
    assert!(formatted.contains("\n  v * s / (km + s)\n"));
}

#[test]
fn formatting_is_idempotent() {
    let ctx = Context::new();
    for src in [GLYCOLYSIS, "a=1;b=2\nJ0:A->B;k", "model m\n  x=  -1\nend"] {
        let once = format(&ctx.parse(src));
        let twice = format(&ctx.parse(&once));
        assert_eq!(once, twice, "input {:?}", src);
    }
}
