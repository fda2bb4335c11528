use pretty_assertions::assert_eq;

use ctrlunit_rs::{assemble, Emulator, Program, Step};

#[test]
fn assembles_basic_and_macro_lines() {
    assert_eq!(assemble("ld 1").unwrap().to_string(), "11");
    assert_eq!(assemble("ldc 1").unwrap().to_string(), "21");
    // xnor with the argument, then ldc with the literal 0
    assert_eq!(assemble("xor 2").unwrap().to_string(), "7220");
}

#[test]
fn reference_loop_program_runs_word_by_word() {
    let program: Program = "30A0B01181".parse().unwrap();
    let mut emu = Emulator::new(program);
    emu.set_input(1, true).unwrap();

    // AND with input pin 0
    assert_eq!(emu.step().unwrap(), Step::Continue);
    assert!(!emu.cpu.rr);
    assert_eq!(emu.pc(), 1);

    assert_eq!(emu.step().unwrap(), Step::Continue); // IEN 0
    assert_eq!(emu.step().unwrap(), Step::Continue); // OEN 0
    assert_eq!(emu.cpu.ien, 0);
    assert_eq!(emu.cpu.oen, 0);

    assert_eq!(emu.step().unwrap(), Step::Continue); // LD 1
    assert!(emu.cpu.rr);
    assert_eq!(emu.step().unwrap(), Step::Halt); // STO 1
    assert_eq!(emu.pc(), 5);
    assert!(emu.output(1).unwrap());

    // the caller restarts the loop
    emu.reset();
    assert_eq!(emu.pc(), 0);
    emu.set_input(1, false).unwrap();
    while emu.step().unwrap() == Step::Continue {}
    assert!(!emu.output(1).unwrap());
}

#[test]
fn reference_program_from_source() {
    let src = "\
and !rr   ; clear RR
ien !rr
oen !rr
ld 1      ; copy input 1
sto 1     ; to output 1
";
    assert_eq!(assemble(src).unwrap().to_string(), "30a0b01181");
}

#[test]
fn enable_registers_take_the_raw_operand() {
    let mut emu = Emulator::new("A5B7".parse().unwrap());
    emu.set_input(5, true).unwrap();
    emu.set_input(7, true).unwrap();
    assert_eq!(emu.step().unwrap(), Step::Continue);
    assert_eq!(emu.step().unwrap(), Step::Halt);
    assert_eq!(emu.cpu.ien, 5);
    assert_eq!(emu.cpu.oen, 7);
}
