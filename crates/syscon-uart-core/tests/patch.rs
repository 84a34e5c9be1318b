//! EEPROM patch writer over an authenticated session

mod common;

use common::{cxr_answer, session, valid_challenge, ScriptedLink};
use pretty_assertions::assert_eq;
use std::time::Duration;
use syscon_uart_core::patch::{PatchError, PatchPlan, PatchTarget};
use syscon_uart_core::protocol::{Session, WireVariant};

fn patch_image() -> Vec<u8> {
    (0..0x1000u32).map(|i| (i % 251) as u8).collect()
}

fn authenticated_session(answers: Vec<Vec<u8>>, fallback: Vec<u8>) -> Session<ScriptedLink> {
    let challenge = hex::encode_upper(valid_challenge([7; 8]));
    let mut script = vec![
        cxr_answer("R", &format!("OK 00000000 {}", challenge)),
        cxr_answer("R", "OK 00000000"),
    ];
    script.extend(answers);

    let link = ScriptedLink::with_answers(script).answering_always(fallback);
    let mut session = session(link, WireVariant::Cxr);
    session.auth().unwrap();
    session.link_mut().writes.clear();
    session
}

#[test]
fn test_blocks_cover_both_regions() {
    let plan = PatchPlan::for_target(PatchTarget::Cxr714);
    let image = patch_image();
    let blocks = plan.blocks(&image).unwrap();

    assert_eq!(blocks.len(), 0x1000 / 0x40);
    assert_eq!(blocks[0].address, 0x2800);
    assert_eq!(blocks[15].address, 0x2BC0);
    assert_eq!(blocks[16].address, 0x4400);
    assert_eq!(blocks[16].region, 1);
    assert_eq!(blocks.last().unwrap().address, 0x4FC0);

    let expected = format!("EEP SET 2800 40 {}", hex::encode(&image[..0x40]));
    assert_eq!(blocks[0].command, expected);
}

#[test]
fn test_image_too_small() {
    let plan = PatchPlan::for_target(PatchTarget::Cxr713);
    let err = plan.blocks(&[0u8; 0x800]).unwrap_err();
    assert!(matches!(
        err,
        PatchError::ImageTooSmall {
            needed: 0x1000,
            actual: 0x800
        }
    ));
    assert_eq!(
        err.to_string(),
        "Patch image too small: need 4096 bytes, got 2048"
    );
}

#[test]
fn test_apply_requires_authentication() {
    let plan = PatchPlan::for_target(PatchTarget::Cxr714);
    let mut session = session(ScriptedLink::new(), WireVariant::Cxr);

    let err = plan
        .apply(&mut session, &patch_image(), Duration::ZERO)
        .unwrap_err();
    assert!(matches!(err, PatchError::NotAuthenticated));
    assert!(session.link().writes.is_empty());
}

#[test]
fn test_apply_writes_every_block_and_reports_status() {
    let mut session = authenticated_session(
        vec![cxr_answer("E", "NG 00000010")],
        cxr_answer("R", "OK 00000000"),
    );
    let plan = PatchPlan::for_target(PatchTarget::Cxr714);

    let reports = plan
        .apply(&mut session, &patch_image(), Duration::ZERO)
        .unwrap();

    assert_eq!(reports.len(), 64);
    assert_eq!(reports[0].status, 0x10);
    assert!(reports[1..].iter().all(|r| r.status == 0));

    let lines = session.link().command_lines();
    assert_eq!(lines.len(), 64);
    assert!(lines[0].ends_with(&hex::encode(&patch_image()[..0x40])));
    assert!(lines[16].contains("EEP SET 4400 40 "));
}
