//! Property-based tests for login field location and filling.
//!
//! Pages are generated with a single login form surrounded by decoy forms
//! that hold only text inputs. The locator must always pick the login
//! form's fields, and a fill must touch nothing else.

use passfill::services::content_script::ContentScript;
use passfill::services::field_locator::{FieldLocator, FieldLocatorTrait};
use passfill::types::dom::Document;
use passfill::types::message::ContentMessage;
use passfill::types::settings::LocatorStrategy;
use proptest::prelude::*;

/// A decoy form: a few text-like inputs and no password.
fn arb_decoy_form() -> impl Strategy<Value = String> {
    prop::collection::vec(
        (
            prop_oneof![Just("text"), Just("email"), Just("search"), Just("checkbox")],
            "[a-z]{3,8}",
        ),
        1..4,
    )
    .prop_map(|inputs| {
        let body: String = inputs
            .iter()
            .map(|(ty, name)| format!(r#"<input type="{}" name="decoy-{}">"#, ty, name))
            .collect();
        format!("<form>{}</form>", body)
    })
}

/// A page with decoys before and after one login form. Returns the HTML
/// plus the `name` of the login form's username and password inputs.
fn arb_login_page() -> impl Strategy<Value = (String, String, String)> {
    (
        prop::collection::vec(arb_decoy_form(), 0..3),
        prop::collection::vec(arb_decoy_form(), 0..3),
        0usize..3,
        prop_oneof![Just("text"), Just("email")],
        "[a-z]{3,8}",
        "[a-z]{3,8}",
    )
        .prop_map(|(before, after, hidden, user_type, user, pass)| {
            let user_name = format!("login-{}", user);
            let pass_name = format!("secret-{}", pass);
            let hidden: String = (0..hidden)
                .map(|i| format!(r#"<input type="hidden" name="h{}">"#, i))
                .collect();
            let login = format!(
                r#"<form>{}<input type="{}" name="{}"><input type="password" name="{}"><button>Sign in</button></form>"#,
                hidden, user_type, user_name, pass_name
            );
            let html = format!("{}<div>{}</div>{}", before.concat(), login, after.concat());
            (html, user_name, pass_name)
        })
}

// *For any* page with one login form among decoy forms, the scoped locator
// returns that form's text input and password input.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn scoped_locator_picks_login_form((html, user_name, pass_name) in arb_login_page()) {
        let doc = Document::parse(&html);
        let fields = FieldLocator::new(LocatorStrategy::Scoped).locate(&doc);

        let username = doc.input(fields.username.expect("username located")).unwrap();
        let password = doc.input(fields.password.expect("password located")).unwrap();

        prop_assert_eq!(username.attr("name"), Some(user_name.as_str()));
        prop_assert_eq!(password.attr("name"), Some(pass_name.as_str()));
        prop_assert!(doc.form_of(username.id).is_some());
        prop_assert_eq!(doc.form_of(username.id), doc.form_of(password.id));
    }

    #[test]
    fn fill_only_touches_located_fields(
        (html, user_name, pass_name) in arb_login_page(),
        username in "[a-zA-Z0-9@.]{1,20}",
        password in "[ -~]{1,20}",
    ) {
        let mut script = ContentScript::from_html(&html, LocatorStrategy::Scoped);
        let report = script.handle_message(&ContentMessage::Fill {
            username: Some(username.clone()),
            password: Some(password.clone()),
        });

        prop_assert!(report.username_filled);
        prop_assert!(report.password_filled);
        for input in script.document().inputs() {
            let expected = match input.attr("name") {
                Some(name) if name == user_name => username.as_str(),
                Some(name) if name == pass_name => password.as_str(),
                _ => "",
            };
            prop_assert_eq!(input.value.as_str(), expected);
        }
    }

    // Without a password input the scoped locator falls back to names, and
    // never reports a field whose name does not look like one.
    #[test]
    fn fallback_only_matches_credential_like_names(
        names in prop::collection::vec("[a-z]{3,10}", 1..6),
    ) {
        let html: String = names
            .iter()
            .map(|n| format!(r#"<input type="text" name="{}">"#, n))
            .collect();
        let doc = Document::parse(&html);
        let fields = FieldLocator::new(LocatorStrategy::Scoped).locate(&doc);

        if let Some(id) = fields.username {
            let name = doc.input(id).unwrap().attr("name").unwrap().to_lowercase();
            prop_assert!(name.contains("user") || name.contains("email") || name.contains("login"));
        }
        if let Some(id) = fields.password {
            let name = doc.input(id).unwrap().attr("name").unwrap().to_lowercase();
            prop_assert!(name.contains("pass"));
        }
    }
}
