use crate::{TempDir, command::assert_cmd_snapshot};

/// Keys only available from the default locale or the root file are listed.
#[test]
fn untranslated() {
    let dir = TempDir::with_fixtures();
    assert_cmd_snapshot!(
        dir.loctext(["check", "-d", "i18n", "-l", "de-AT"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----
    brand
    event

    ----- stderr -----
    2 of 4 message(s) in `messages` are untranslated for `de-AT`
    ",
    );

    assert_cmd_snapshot!(
        dir.loctext(["check", "-d", "i18n", "-l", "fr"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----
    brand
    event
    total

    ----- stderr -----
    3 of 4 message(s) in `messages` are untranslated for `fr`
    ",
    );
}

#[test]
fn fully_translated() {
    let dir = TempDir::with_fixtures();
    assert_cmd_snapshot!(
        dir.loctext(["check", "-d", "i18n", "-b", "app", "-l", "fr-CA"]),
        @r"
    success: true
    exit_code: 0
    ----- stdout -----

    ----- stderr -----
    ",
    );
}

#[test]
fn no_files_for_base() {
    let dir = TempDir::with_fixtures();
    assert_cmd_snapshot!(
        dir.loctext(["check", "-d", "i18n", "-b", "web", "-l", "fr"]),
        @r"
    success: false
    exit_code: 1
    ----- stdout -----

    ----- stderr -----
    failed to load message bundle `web` from i18n: no `web.properties` or `web_<locale>.properties` files found
    ",
    );
}
