use pretty_assertions::assert_eq;

use ctrlunit_rs::macros::{ArgSpec, Expander, MacroStep, MacroTable};
use ctrlunit_rs::{AsmConfig, AsmError, Assembler, Program};

fn hex(table: &MacroTable, name: &str, args: &[u8]) -> String {
    let insns = Expander::new(table).expand(name, args).unwrap();
    Program::from_instructions(insns).to_string()
}

fn assembler_with(json: &str) -> Assembler {
    let mut cfg = AsmConfig::default();
    cfg.macros.extend(MacroTable::from_json(json).unwrap());
    Assembler::with_config(cfg).unwrap()
}

#[test]
fn builtin_macros() {
    let t = MacroTable::builtin();
    assert_eq!(hex(&t, "xor", &[2]), "7220");
    assert_eq!(hex(&t, "nand", &[9]), "49");
    assert_eq!(hex(&t, "nor", &[0]), "60");
    // bare skz/nop steps take the default operand
    assert_eq!(hex(&t, "jz", &[8]), "e1c8");
    assert_eq!(hex(&t, "jnz", &[9]), "e1c1010101c9");
}

#[test]
fn nested_macros_forward_arguments() {
    let asm = assembler_with(r#"{ "xor2": [["xor", -1], ["xor", -2]], "xorc": [["xor", 9]] }"#);
    let p = asm.assemble_program("xor2 3 5\nxorc").unwrap();
    assert_eq!(p.to_string(), "732075207920");
}

#[test]
fn missing_back_reference_is_too_few_arguments() {
    let t = MacroTable::builtin();
    assert_eq!(
        Expander::new(&t).expand("xor", &[]).unwrap_err(),
        AsmError::TooFewArguments { macro_name: "xor".into(), index: 1, supplied: 0 }
    );

    let asm = assembler_with(r#"{ "pair": [["ld", -1], ["sto", -2]] }"#);
    let err = asm.assemble_program("pair 1").unwrap_err();
    assert_eq!(
        err.source,
        AsmError::TooFewArguments { macro_name: "pair".into(), index: 2, supplied: 1 }
    );
}

#[test]
fn bad_steps_fail_expansion_and_validation() {
    let mut t = MacroTable::default();
    t.insert("bad", vec![MacroStep::call("frob", [ArgSpec::Literal(1)])]);
    let want = AsmError::UnknownMacroTarget { macro_name: "bad".into(), target: "frob".into() };
    assert_eq!(Expander::new(&t).expand("bad", &[]).unwrap_err(), want);
    assert_eq!(t.validate().unwrap_err(), want);

    let mut t = MacroTable::default();
    t.insert("wide", vec![MacroStep::call("ld", [ArgSpec::BackRef(1), ArgSpec::BackRef(2)])]);
    let want = AsmError::TooManyArguments { target: "ld".into(), max: 1, found: 2 };
    assert_eq!(Expander::new(&t).expand("wide", &[1, 2]).unwrap_err(), want);
    assert_eq!(t.validate().unwrap_err(), want);

    let mut t = MacroTable::default();
    t.insert("bare", vec![MacroStep::bare("ld")]);
    let want = AsmError::MissingOperand { mnemonic: "ld".into() };
    assert_eq!(Expander::new(&t).expand("bare", &[]).unwrap_err(), want);
    assert_eq!(t.validate().unwrap_err(), want);
}

#[test]
fn cycles_are_caught_by_validation() {
    let t = MacroTable::from_json(r#"{ "a": [["b", -1]], "b": [["nop"], ["a", -1]] }"#).unwrap();
    assert_eq!(
        t.validate().unwrap_err(),
        AsmError::MacroCycle { path: vec!["a".into(), "b".into(), "a".into()] }
    );

    let t = MacroTable::from_json(r#"{ "spin": ["spin"] }"#).unwrap();
    assert_eq!(
        t.validate().unwrap_err().to_string(),
        "macro reference cycle: spin -> spin"
    );
}

#[test]
fn unvalidated_cycle_hits_the_depth_limit() {
    let t = MacroTable::from_json(r#"{ "a": [["b", -1]], "b": [["a", -1]] }"#).unwrap();
    let err = Expander::new(&t).with_max_depth(16).expand("a", &[1]).unwrap_err();
    assert!(matches!(err, AsmError::MacroDepthExceeded { limit: 16, .. }));
}

#[test]
fn deep_acyclic_chain_respects_configured_depth() {
    let json = r#"{ "m0": [["m1", -1]], "m1": [["m2", -1]], "m2": [["m3", -1]], "m3": [["ld", -1]] }"#;
    let mut cfg = AsmConfig { max_macro_depth: 3, ..AsmConfig::default() };
    cfg.macros.extend(MacroTable::from_json(json).unwrap());
    let asm = Assembler::with_config(cfg.clone()).unwrap();
    assert!(matches!(
        asm.assemble_line("m0 5"),
        Err(AsmError::MacroDepthExceeded { limit: 3, .. })
    ));
    assert_eq!(asm.assemble_program("m1 5").unwrap().to_string(), "15");

    cfg.max_macro_depth = 4;
    let asm = Assembler::with_config(cfg).unwrap();
    assert_eq!(asm.assemble_program("m0 5").unwrap().to_string(), "15");
}

#[test]
fn json_table_matches_builtin_encoding() {
    let json = r#"{
        "nand": [["andc", -1]],
        "nor": [["orc", -1]],
        "jz": ["skz", ["jmp", -1]],
        "jnz": [["skz", 1], ["jmp", 1], "nop", "nop", "nop", ["jmp", -1]],
        "xor": [["xnor", -1], ["ldc", 0]]
    }"#;
    assert_eq!(MacroTable::from_json(json).unwrap(), MacroTable::builtin());

    let v = serde_json::to_value(MacroTable::builtin()).unwrap();
    assert_eq!(v["jz"][0], "skz");
    assert_eq!(v["xor"][0], serde_json::json!(["xnor", -1]));
}

#[test]
fn json_literals_must_be_hex_digits() {
    assert!(MacroTable::from_json(r#"{ "m": [["ld", 16]] }"#).is_err());
}

#[test]
fn macro_arguments_accept_the_rr_alias() {
    assert_eq!(
        Assembler::new().assemble_program("xor !rr").unwrap().to_string(),
        "7020"
    );
}

#[test]
fn only_referenced_arguments_are_parsed() {
    let asm = Assembler::new();
    assert_eq!(asm.assemble_program("xor 2 zz").unwrap().to_string(), "7220");
    assert_eq!(
        asm.assemble_line("xor zz 2").unwrap_err(),
        AsmError::InvalidOperand { token: "zz".into() }
    );
    // a nested macro receives values, not tokens
    let asm = assembler_with(r#"{ "second": [["xor", -2]] }"#);
    assert_eq!(asm.assemble_program("second qq 5").unwrap().to_string(), "7520");
}
