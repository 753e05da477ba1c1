mod common;

use cil_isa::*;
use common::{SAMPLE_METHOD, assert_contiguous, switch_bytes};

#[test]
fn decode_empty_is_ok() {
    assert!(decode(&[]).unwrap().is_empty());
    assert!(Decoder::new(&[] as &[u8]).next().is_none());
}

#[test]
fn sample_method_first_instruction() {
    let first = Decoder::new(&SAMPLE_METHOD[..]).next().unwrap().unwrap();
    assert_eq!(first.offset(), 0);
    assert_eq!(first.mnemonic(), "ldarg.0");
    assert_eq!(first.opcode(), OpcodeId::single(0x02));
    assert_eq!(first.operand_kind(), OperandKind::InlineNone);
    assert!(first.operand().is_empty());
    assert_eq!(first.len(), 1);
}

#[test]
fn sample_method_decodes_completely() {
    let insns = decode(&SAMPLE_METHOD).unwrap();
    assert_contiguous(&insns, SAMPLE_METHOD.len());

    let summary: Vec<(usize, &str)> = insns.iter().map(|i| (i.offset(), i.mnemonic())).collect();
    assert_eq!(
        summary,
        [
            (0, "ldarg.0"),
            (1, "ldind.i4"),
            (2, "ldnull"),
            (3, "call"),
            (8, "ldnull"),
            (9, "call"),
            (14, "nop"),
            (15, "nop"),
            (16, "ldloc.0"),
            (17, "ldc.i4.1"),
            (18, "add"),
            (19, "stloc.0"),
            (20, "ldloc.0"),
            (21, "ldc.i4.s"),
            (23, "clt"),
            (25, "stloc.1"),
            (26, "ldloc.1"),
            (27, "brtrue.s"),
            (29, "ret"),
        ]
    );

    let call = &insns[3];
    assert_eq!(call.operand(), [0x3a, 0x00, 0x00, 0x0a]);
    assert_eq!(call.operand_kind(), OperandKind::InlineMethod);

    let clt = &insns[14];
    assert_eq!(clt.opcode(), OpcodeId::double(0xFE, 0x04));
    assert_eq!(clt.len(), 2);
    assert!(clt.operand().is_empty());
}

#[test]
fn operand_bytes_are_not_swapped() {
    let insns = decode(&[0x21, 1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
    assert_eq!(insns[0].mnemonic(), "ldc.i8");
    assert_eq!(insns[0].operand(), [1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn two_byte_opcode_with_operand() {
    let insns = decode(&[0xFE, 0x08, 0x02, 0x01]).unwrap();
    assert_eq!(insns[0].mnemonic(), "ldarg");
    assert_eq!(insns[0].operand_kind(), OperandKind::InlineVar);
    assert_eq!(insns[0].operand(), [0x02, 0x01]);
    assert_eq!(insns[0].len(), 4);
}

#[test]
fn switch_consumes_count_and_targets() {
    let mut code = switch_bytes(&[0x10, -4]);
    code.push(0x2A);
    let insns = decode(&code).unwrap();
    assert_contiguous(&insns, code.len());

    let switch = &insns[0];
    assert_eq!(switch.mnemonic(), "switch");
    assert_eq!(switch.operand_kind(), OperandKind::InlineSwitch);
    assert_eq!(switch.operand().len(), 4 + 2 * 4);
    assert_eq!(switch.len(), 1 + 12);
    assert_eq!(&switch.operand()[..4], 2u32.to_le_bytes());
    assert_eq!(insns[1].offset(), 13);
    assert_eq!(insns[1].mnemonic(), "ret");
}

#[test]
fn empty_switch_table() {
    let code = switch_bytes(&[]);
    let insns = decode(&code).unwrap();
    assert_eq!(insns.len(), 1);
    assert_eq!(insns[0].operand(), [0, 0, 0, 0]);
    assert_eq!(insns[0].len(), 5);
}

#[test]
fn switch_at_the_ceiling_is_accepted() {
    let options = DecoderOptions {
        max_switch_targets: 3,
    };
    let code = switch_bytes(&[1, 2, 3]);
    let insns = decode_with(&code, options).unwrap();
    assert_eq!(insns[0].len(), 1 + 4 + 12);
}

#[test]
fn default_ceiling_allows_largest_table() {
    let targets = vec![0i32; DEFAULT_MAX_SWITCH_TARGETS as usize];
    let code = switch_bytes(&targets);
    let insns = decode(&code).unwrap();
    assert_contiguous(&insns, code.len());
}

#[test]
fn decoder_is_lazy_and_tracks_offset() {
    // The trailing 0xFF is never reached if we stop early.
    let code: &[u8] = &[0x00, 0x20, 1, 0, 0, 0, 0xFF];
    let mut decoder = Decoder::new(code);
    assert_eq!(decoder.offset(), 0);
    assert_eq!(decoder.next().unwrap().unwrap().mnemonic(), "nop");
    assert_eq!(decoder.offset(), 1);
    assert_eq!(decoder.next().unwrap().unwrap().mnemonic(), "ldc.i4");
    assert_eq!(decoder.offset(), 6);
}

#[test]
fn decoder_stops_after_clean_end() {
    let mut decoder = Decoder::new(&[0x2A][..]);
    assert!(decoder.next().unwrap().is_ok());
    assert!(decoder.next().is_none());
    assert!(decoder.next().is_none());
    assert!(!decoder.has_failed());
}

#[test]
fn decoder_reads_from_any_reader() {
    let cursor = std::io::Cursor::new(SAMPLE_METHOD.to_vec());
    let insns: Vec<_> = Decoder::new(cursor).collect::<Result<_, _>>().unwrap();
    assert_eq!(insns, decode(&SAMPLE_METHOD).unwrap());
}

#[test]
fn every_single_byte_opcode_decodes_with_zeroed_operand() {
    for info in opcode_table() {
        let mut code = info.id().as_bytes().to_vec();
        match info.operand_kind().size() {
            OperandSize::Fixed(n) => code.resize(code.len() + n, 0),
            OperandSize::Dynamic => code.extend_from_slice(&0u32.to_le_bytes()),
        }
        let insns = decode(&code).unwrap_or_else(|e| panic!("{}: {e}", info.mnemonic()));
        assert_eq!(insns.len(), 1, "{}", info.mnemonic());
        assert_eq!(insns[0].info(), info);
        assert_eq!(insns[0].len(), code.len(), "{}", info.mnemonic());
    }
}

#[test]
fn listing_lines() {
    let insns = decode(&SAMPLE_METHOD).unwrap();
    let lines: Vec<String> = insns.iter().map(ToString::to_string).collect();
    assert_eq!(lines[0], "IL_0000 ldarg.0     ");
    assert_eq!(lines[3], "IL_0003 call        3a 00 00 0a");
    assert_eq!(lines[13], "IL_0015 ldc.i4.s    0a");
    assert_eq!(lines[14], "IL_0017 clt         ");
    assert_eq!(lines[17], "IL_001b brtrue.s    db");
}

#[test]
fn twelve_character_mnemonic_fills_the_column() {
    let code = [0xFE, 0x16, 0x01, 0x00, 0x00, 0x02, 0x6F, 0x0A, 0x00, 0x00, 0x0A];
    let insns = decode(&code).unwrap();
    assert_eq!(insns[0].to_string(), "IL_0000 constrained.01 00 00 02");
    assert_eq!(insns[1].to_string(), "IL_0006 callvirt    0a 00 00 0a");
}

#[test]
fn yaml_output_keeps_every_field() {
    let mut code = vec![0x28, 0x3a, 0x00, 0x00, 0x0a];
    code.extend(switch_bytes(&[1, -1]));
    let insns = decode(&code).unwrap();

    let yaml = serde_yaml::to_string(&insns).unwrap();
    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let items = value.as_sequence().unwrap();
    assert_eq!(items.len(), 2);

    let call = &items[0];
    assert_eq!(call["offset"].as_u64(), Some(0));
    assert_eq!(call["id"].as_u64(), Some(0x28));
    assert_eq!(call["mnemonic"].as_str(), Some("call"));
    assert_eq!(call["category"].as_str(), Some("base"));
    assert_eq!(call["operand_kind"].as_str(), Some("InlineMethod"));
    assert_eq!(call["length"].as_u64(), Some(5));
    assert_eq!(call["operand"].as_str(), Some("3a 00 00 0a"));

    let switch = &items[1];
    assert_eq!(switch["offset"].as_u64(), Some(5));
    assert_eq!(switch["id"].as_u64(), Some(0x45));
    assert_eq!(switch["mnemonic"].as_str(), Some("switch"));
    assert_eq!(switch["operand_kind"].as_str(), Some("InlineSwitch"));
    assert_eq!(switch["length"].as_u64(), Some(13));
    assert_eq!(
        switch["operand"].as_str(),
        Some("02 00 00 00 01 00 00 00 ff ff ff ff")
    );
}

#[test]
fn yaml_two_byte_opcode_id() {
    let insns = decode(&[0xfe, 0x01]).unwrap();
    let value: serde_yaml::Value = serde_yaml::to_value(&insns[0]).unwrap();
    assert_eq!(value["id"].as_u64(), Some(0xfe01));
    assert_eq!(value["mnemonic"].as_str(), Some("ceq"));
    assert_eq!(value["operand_kind"].as_str(), Some("InlineNone"));
    assert_eq!(value["operand"].as_str(), Some(""));
}
