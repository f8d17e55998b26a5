use vox_computer_control::*;

#[test]
fn test_hotkey_releases_in_reverse_order() {
    let controller = RecordingController::new();
    controller
        .hotkey(&[Key::Control, Key::Shift, Key::Escape])
        .unwrap();

    assert_eq!(
        controller.actions(),
        vec![
            Action::KeyDown(Key::Control),
            Action::KeyDown(Key::Shift),
            Action::KeyDown(Key::Escape),
            Action::KeyUp(Key::Escape),
            Action::KeyUp(Key::Shift),
            Action::KeyUp(Key::Control),
        ]
    );
}

#[test]
fn test_failed_hotkey_releases_pressed_modifiers() {
    let controller = RecordingController::new().fail_key(Key::Char('v'));
    let result = controller.hotkey(&[Key::Control, Key::Char('v')]);

    assert!(result.is_err());
    // Control must not be left held down
    assert_eq!(
        controller.actions(),
        vec![Action::KeyDown(Key::Control), Action::KeyUp(Key::Control)]
    );
}

#[test]
fn test_type_text_shifts_uppercase() {
    let controller = RecordingController::new();
    controller.type_text("Hi").unwrap();

    assert_eq!(
        controller.actions(),
        vec![
            Action::KeyDown(Key::Shift),
            Action::KeyDown(Key::Char('h')),
            Action::KeyUp(Key::Char('h')),
            Action::KeyUp(Key::Shift),
            Action::KeyDown(Key::Char('i')),
            Action::KeyUp(Key::Char('i')),
        ]
    );
}

#[test]
fn test_default_paste_chord() {
    let controller = RecordingController::new();
    assert_eq!(controller.paste_chord(), vec![Key::Control, Key::Char('v')]);
}

#[test]
fn test_launcher_chord() {
    assert_eq!(RecordingController::new().launcher_chord(), vec![Key::Meta]);

    let controller = RecordingController::new().with_launcher_chord(vec![Key::Meta, Key::Space]);
    assert_eq!(controller.launcher_chord(), vec![Key::Meta, Key::Space]);
}

#[test]
fn test_open_url_failure_is_not_recorded() {
    let controller = RecordingController::new().fail_open_url();
    assert!(controller.open_url("https://example.com").is_err());
    assert!(controller.opened_urls().is_empty());

    let ok = RecordingController::new();
    ok.open_url("ms-settings:bluetooth").unwrap();
    assert_eq!(ok.opened_urls(), vec!["ms-settings:bluetooth".to_string()]);
}

#[test]
#[ignore = "needs a desktop session"]
fn test_create_controller_on_desktop() {
    let controller = create_controller().expect("Failed to create controller");
    assert!(!controller.name().is_empty());
}
