use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

use ctrlunit_rs::memory::{BusError, Space};
use ctrlunit_rs::{assemble, Emulator, PinSignal, Program, Step, Trap};

fn bits(pairs: &[(u8, u8)]) -> BTreeMap<u8, u8> {
    pairs.iter().copied().collect()
}

#[test]
fn power_on_state() {
    let emu = Emulator::new(Program::default());
    let snap = emu.snapshot();
    assert_eq!(snap.rr, 0);
    assert_eq!(snap.inputs, bits(&[(0, 1), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0), (6, 0), (7, 0)]));
    assert_eq!(snap.ram.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(snap.outputs.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn high_operand_bit_selects_ram() {
    let mut emu = Emulator::new(assemble("ld 1\nsto b\nldc !rr\nld b").unwrap());
    emu.set_input(1, true).unwrap();
    emu.run().unwrap();
    assert!(emu.ram(3).unwrap());
    assert!(emu.cpu.rr);
    // the pin with the same low bits is untouched
    assert!(!emu.output(3).unwrap());
}

#[test]
fn ram_and_output_address_zero_are_unmapped() {
    let mut emu = Emulator::new(assemble("sto 8").unwrap());
    match emu.step() {
        Err(Trap::Bus { pc, source }) => {
            assert_eq!(pc, 0);
            assert_eq!(source, BusError::Unmapped { space: Space::Ram, addr: 0 });
        }
        other => panic!("expected bus trap, got {other:?}"),
    }

    let mut emu = Emulator::new(assemble("ld 1\nsto 0").unwrap());
    assert_eq!(emu.step().unwrap(), Step::Continue);
    assert!(matches!(
        emu.step(),
        Err(Trap::Bus { pc: 1, source: BusError::Unmapped { space: Space::Output, addr: 0 } })
    ));

    let mut emu = Emulator::new(assemble("ld 8").unwrap());
    assert!(matches!(emu.step(), Err(Trap::Bus { .. })));

    // input pin 0 exists
    let mut emu = Emulator::new(assemble("ld 0").unwrap());
    assert_eq!(emu.step().unwrap(), Step::Halt);
    assert!(emu.cpu.rr);
}

#[test]
fn trapped_access_is_not_skipped() {
    let mut emu = Emulator::new(assemble("sto 8\nstoc 1").unwrap());
    assert!(matches!(emu.step(), Err(Trap::Bus { pc: 0, .. })));
    assert_eq!(emu.pc(), 0);
    assert_eq!(emu.snapshot().pc, 0);

    // stepping again hits the same word, the store after it never runs
    assert!(matches!(emu.step(), Err(Trap::Bus { pc: 0, .. })));
    assert_eq!(emu.pc(), 0);
    assert!(!emu.output(1).unwrap());
}

#[test]
fn inputs_outside_the_pin_range_are_rejected() {
    let mut emu = Emulator::new(Program::default());
    assert_eq!(
        emu.set_input(8, true),
        Err(BusError::Unmapped { space: Space::Input, addr: 8 })
    );
    emu.set_input(0, false).unwrap();
    assert_eq!(emu.snapshot().inputs[&0], 0);
}

#[test]
fn snapshot_reports_signals_and_dumps() {
    let mut emu = Emulator::new(assemble("ld !rr\nsto 2\nien 3").unwrap());
    emu.run().unwrap();
    let snap = emu.snapshot();

    let high: Vec<String> = snap
        .signals()
        .iter()
        .filter(|s| s.value)
        .map(|s| s.to_string())
        .collect();
    assert_eq!(high, vec!["2:1".to_string()]);

    let text = snap.to_string();
    assert!(text.contains("RR = 0x1"));
    assert!(text.contains("IEN = 0x3"));
    assert!(text.contains("1: 0x0 2: 0x1 3: 0x0"));

    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["rr"], 1);
    assert_eq!(json["outputs"]["2"], 1);
}

#[test]
fn pin_signal_text_form() {
    assert_eq!("2:1".parse::<PinSignal>().unwrap(), PinSignal { pin: 2, value: true });
    assert_eq!(" 7:0 ".parse::<PinSignal>().unwrap(), PinSignal { pin: 7, value: false });
    assert!("2:x".parse::<PinSignal>().is_err());
    assert!("9".parse::<PinSignal>().is_err());
    assert_eq!(PinSignal { pin: 4, value: false }.to_string(), "4:0");
}
