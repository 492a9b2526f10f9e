//! End-to-end tagging pipeline tests.
//!
//! Runs the registered commands over outline pages held in an
//! `InMemoryHost`, with a scripted provider or the real client against a
//! mock server, and checks both the document and the notifications.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use autotag::commands::{CMD_BLOCK, CMD_PAGE, CMD_SELECTION};
use autotag::host::outline::OutlineParser;
use autotag::host::{InMemoryHost, RecordingNotifier};
use autotag::llm::OpenAiClient;
use autotag::{
    CommandContext, CommandOutcome, CommandRegistry, Error, PageRef, Result, Severity,
    SuggestionProvider, TaggingService, register_default_commands,
};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PAGE: &str = concat!(
    "title:: Weekly review\n",
    "- Shipped the CSV importer\n",
    "  id:: 64f1c2\n",
    "\t- follow up on encoding bugs\n",
    "- Planned the Q3 roadmap\n",
);

/// Provider returning a fixed reply and recording prompts.
struct Scripted {
    reply: std::result::Result<String, (u16, String)>,
    credential: bool,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            credential: true,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            ..Self::ok("")
        }
    }

    fn without_credential() -> Self {
        Self {
            credential: false,
            ..Self::ok("A")
        }
    }
}

/// Shared handle so tests can inspect the provider after handing it over.
struct Handle(Arc<Scripted>);

impl SuggestionProvider for Handle {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn validate(&self) -> Result<()> {
        if self.0.credential {
            Ok(())
        } else {
            Err(Error::MissingCredential)
        }
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        self.0.prompts.lock().unwrap().push(prompt.to_string());
        self.0
            .reply
            .clone()
            .map_err(|(status, message)| Error::Api { status, message })
    }
}

struct Harness {
    host: Arc<InMemoryHost>,
    page: PageRef,
    notifier: Arc<RecordingNotifier>,
    provider: Arc<Scripted>,
    registry: CommandRegistry,
}

impl Harness {
    fn new(outline: &str, provider: Scripted) -> Self {
        let (host, page) = OutlineParser::parse("weekly", outline).unwrap();
        let host = Arc::new(host);
        let notifier = Arc::new(RecordingNotifier::new());
        let provider = Arc::new(provider);
        let service = TaggingService::new(
            Handle(Arc::clone(&provider)),
            host.clone(),
            notifier.clone(),
        )
        .with_reference_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
        let mut registry = CommandRegistry::new();
        register_default_commands(&mut registry, Arc::new(service));
        Self {
            host,
            page,
            notifier,
            provider,
            registry,
        }
    }

    fn block_ctx(&self, path: &str) -> CommandContext {
        let id = OutlineParser::resolve_path(&self.host, &self.page, path).unwrap();
        CommandContext::for_block(id).with_page(self.page.clone())
    }

    fn run(&self, command: &str, ctx: &CommandContext) -> CommandOutcome {
        self.registry.invoke(command, ctx).unwrap()
    }

    fn render(&self) -> String {
        OutlineParser::render(&self.host, &self.page).unwrap()
    }

    fn calls(&self) -> usize {
        self.provider.calls.load(Ordering::SeqCst)
    }
}

mod block_mode {
    use super::*;

    #[test]
    fn test_reply_normalized_and_written_as_child() {
        let h = Harness::new(PAGE, Scripted::ok("AI, Tech, AI"));

        let outcome = h.run(CMD_BLOCK, &h.block_ctx("2"));

        let CommandOutcome::Tagged { tags, .. } = outcome else {
            panic!("expected tags");
        };
        assert_eq!(tags.as_slice(), ["AI", "TECH"]);
        assert_eq!(
            h.render(),
            concat!(
                "- title:: Weekly review\n",
                "- Shipped the CSV importer\n",
                "  id:: 64f1c2\n",
                "\t- follow up on encoding bugs\n",
                "\t- tags:: AI, TECH\n",
                "- Planned the Q3 roadmap\n",
            )
        );
    }

    #[test]
    fn test_prompt_excludes_properties_and_children() {
        let h = Harness::new(PAGE, Scripted::ok("CSV"));

        h.run(CMD_BLOCK, &h.block_ctx("2"));

        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Text: \"Shipped the CSV importer\""));
        assert!(!prompts[0].contains("64f1c2"));
        assert!(!prompts[0].contains("encoding bugs"));
        assert!(prompts[0].contains("2025-06-10"));
    }

    #[test]
    fn test_second_run_overwrites_tags_child() {
        let h = Harness::new(PAGE, Scripted::ok("Roadmap, Planning"));
        let ctx = h.block_ctx("3");

        let first = h.run(CMD_BLOCK, &ctx);
        let second = h.run(CMD_BLOCK, &ctx);

        let (CommandOutcome::Tagged { node: a, .. }, CommandOutcome::Tagged { node: b, .. }) =
            (first, second)
        else {
            panic!("expected tags twice");
        };
        assert_eq!(a, b);
        assert_eq!(h.render().matches("tags::").count(), 1);
        assert_eq!(h.notifier.with_severity(Severity::Success).len(), 2);
    }

    #[test]
    fn test_existing_uppercase_tags_child_is_reused() {
        let outline = "- Budget\n\t- TAGS:: OLD\n";
        let h = Harness::new(outline, Scripted::ok("new1, new2"));

        h.run(CMD_BLOCK, &h.block_ctx("1"));

        assert_eq!(h.render(), "- Budget\n\t- tags:: NEW1, NEW2\n");
    }

    #[test]
    fn test_property_only_block_aborts_without_request() {
        let h = Harness::new(PAGE, Scripted::ok("A"));
        let before = h.render();

        let outcome = h.run(CMD_BLOCK, &h.block_ctx("1"));

        assert_eq!(outcome, CommandOutcome::Aborted);
        assert_eq!(h.calls(), 0);
        assert_eq!(h.render(), before);
        let entries = h.notifier.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Warning);
    }
}

mod page_mode {
    use super::*;

    #[test]
    fn test_page_tags_appended_after_last_block() {
        let h = Harness::new(PAGE, Scripted::ok("Review, Roadmap"));

        let outcome = h.run(CMD_PAGE, &CommandContext::default());

        assert!(outcome.is_tagged());
        assert!(h.render().ends_with("- Planned the Q3 roadmap\n- Page Tags:: REVIEW, ROADMAP\n"));

        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Shipped the CSV importer\n\nPlanned the Q3 roadmap"));
        assert!(!prompts[0].contains("Weekly review"));
    }

    #[test]
    fn test_rerun_appends_again_and_ignores_old_tags() {
        let h = Harness::new(PAGE, Scripted::ok("Review"));

        h.run(CMD_PAGE, &CommandContext::default());
        h.run(CMD_PAGE, &CommandContext::default());

        assert_eq!(h.render().matches("Page Tags:: REVIEW").count(), 2);
        let prompts = h.provider.prompts.lock().unwrap();
        assert!(!prompts[1].contains("Page Tags"));
    }

    #[test]
    fn test_empty_page_aborts() {
        let h = Harness::new("", Scripted::ok("A"));

        let outcome = h.run(CMD_PAGE, &CommandContext::default());

        assert_eq!(outcome, CommandOutcome::Aborted);
        assert_eq!(h.calls(), 0);
        assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
    }
}

mod selection_mode {
    use super::*;

    #[test]
    fn test_selection_tags_follow_edited_block() {
        let h = Harness::new(PAGE, Scripted::ok("Encoding"));
        let ctx = h.block_ctx("2").with_selection("  UTF-8 handling  ");

        let outcome = h.run(CMD_SELECTION, &ctx);

        assert!(outcome.is_tagged());
        assert!(h.render().contains(concat!(
            "\t- follow up on encoding bugs\n",
            "- Selection Tags:: ENCODING\n",
            "- Planned the Q3 roadmap\n",
        )));
        let prompts = h.provider.prompts.lock().unwrap();
        assert!(prompts[0].contains("Text: \"UTF-8 handling\""));
    }

    #[test]
    fn test_blank_selection_aborts() {
        let h = Harness::new(PAGE, Scripted::ok("A"));

        let outcome = h.run(CMD_SELECTION, &h.block_ctx("2").with_selection(" \n "));

        assert_eq!(outcome, CommandOutcome::Aborted);
        assert_eq!(h.calls(), 0);
    }
}

mod notifications {
    use super::*;

    #[test]
    fn test_success_emits_progress_then_success() {
        let h = Harness::new(PAGE, Scripted::ok("AI"));

        h.run(CMD_BLOCK, &h.block_ctx("2"));

        let entries = h.notifier.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Info);
        assert!(entries[0].duration.is_some());
        assert_eq!(entries[1].severity, Severity::Success);
        assert!(entries[1].message.contains("AI"));
    }

    #[test]
    fn test_missing_credential_is_one_error() {
        let h = Harness::new(PAGE, Scripted::without_credential());
        let before = h.render();

        let outcome = h.run(CMD_BLOCK, &h.block_ctx("2"));

        assert_eq!(outcome, CommandOutcome::Aborted);
        assert_eq!(h.calls(), 0);
        assert_eq!(h.render(), before);
        let entries = h.notifier.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
    }

    #[test]
    fn test_api_error_message_shown() {
        let h = Harness::new(PAGE, Scripted::failing(401, "Incorrect API key provided"));
        let before = h.render();

        h.run(CMD_BLOCK, &h.block_ctx("2"));

        let errors = h.notifier.with_severity(Severity::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Incorrect API key provided"));
        assert_eq!(h.render(), before);
    }

    #[test]
    fn test_unusable_reply_is_warning() {
        let h = Harness::new(PAGE, Scripted::ok("\"\""));
        let before = h.render();

        let outcome = h.run(CMD_BLOCK, &h.block_ctx("2"));

        assert_eq!(outcome, CommandOutcome::Aborted);
        assert_eq!(h.calls(), 1);
        assert_eq!(h.notifier.with_severity(Severity::Warning).len(), 1);
        assert_eq!(h.render(), before);
    }
}

mod live_client {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test(flavor = "multi_thread")]
    async fn test_block_command_through_http_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "AI, Tech, AI" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1", server.uri());
        let rendered = tokio::task::spawn_blocking(move || {
            let (host, page) = OutlineParser::parse("notes", "- Neural network notes\n").unwrap();
            let host = Arc::new(host);
            let client = OpenAiClient::new().with_api_key("sk-test").with_endpoint(endpoint);
            let notifier = Arc::new(RecordingNotifier::new());
            let service = TaggingService::new(client, host.clone(), notifier)
                .with_reference_date(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap());
            let block = OutlineParser::resolve_path(&host, &page, "1").unwrap();

            assert!(service.tag_block(&block).is_some());
            OutlineParser::render(&host, &page).unwrap()
        })
        .await
        .unwrap();

        assert_eq!(rendered, "- Neural network notes\n\t- tags:: AI, TECH\n");
    }
}
