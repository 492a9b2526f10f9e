//! Command registration.
//!
//! A host invokes commands by name with a [`CommandContext`] describing what
//! the user is focused on. Handlers never fail: problems are reported to the
//! user by the service and surface here as [`CommandOutcome::Aborted`].

use crate::llm::SuggestionProvider;
use crate::models::{NodeId, PageRef, TagSet};
use crate::services::{PlacementMode, TaggingResult, TaggingService};
use crate::{Error, Result};
use std::sync::Arc;

/// Block mode command.
pub const CMD_BLOCK: &str = "ai-tags";

/// Page mode command.
pub const CMD_PAGE: &str = "ai-tags-page";

/// Selection mode command.
pub const CMD_SELECTION: &str = "ai-tags-selection";

/// What the user is focused on when a command runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandContext {
    /// Block being edited.
    pub block: Option<NodeId>,
    /// Page being viewed.
    pub page: Option<PageRef>,
    /// Selected text.
    pub selection: Option<String>,
}

impl CommandContext {
    /// Context focused on `block`.
    #[must_use]
    pub fn for_block(block: impl Into<NodeId>) -> Self {
        Self {
            block: Some(block.into()),
            ..Self::default()
        }
    }

    /// Sets the page.
    #[must_use]
    pub fn with_page(mut self, page: PageRef) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the selected text.
    #[must_use]
    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
}

/// Result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Tags were written to `node`.
    Tagged {
        /// Node holding the tags.
        node: NodeId,
        /// Tags written.
        tags: TagSet,
    },
    /// The command stopped early; the user has been notified.
    Aborted,
}

impl CommandOutcome {
    /// Returns true if tags were written.
    #[must_use]
    pub const fn is_tagged(&self) -> bool {
        matches!(self, Self::Tagged { .. })
    }
}

impl From<Option<TaggingResult>> for CommandOutcome {
    fn from(result: Option<TaggingResult>) -> Self {
        result.map_or(Self::Aborted, |done| Self::Tagged {
            node: done.placement.node().clone(),
            tags: done.tags,
        })
    }
}

/// Command handler.
pub type CommandHandler = Box<dyn Fn(&CommandContext) -> CommandOutcome + Send + Sync>;

/// Named commands in registration order.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&CommandContext) -> CommandOutcome + Send + Sync + 'static,
    {
        let name = name.into();
        let handler: CommandHandler = Box::new(handler);
        if let Some(slot) = self.commands.iter_mut().find(|(n, _)| *n == name) {
            tracing::debug!(command = %name, "replacing command handler");
            slot.1 = handler;
        } else {
            tracing::debug!(command = %name, "registered command");
            self.commands.push((name, handler));
        }
    }

    /// Runs the command registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if no such command is registered.
    pub fn invoke(&self, name: &str, ctx: &CommandContext) -> Result<CommandOutcome> {
        let (_, handler) = self
            .commands
            .iter()
            .find(|(n, _)| n == name)
            .ok_or_else(|| Error::InvalidInput(format!("unknown command: {name}")))?;
        tracing::info!(command = name, "running command");
        Ok(handler(ctx))
    }

    /// Registered command names.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.iter().any(|(n, _)| n == name)
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

/// Registers the block, page and selection tagging commands.
pub fn register_default_commands<P>(registry: &mut CommandRegistry, service: Arc<TaggingService<P>>)
where
    P: SuggestionProvider + 'static,
{
    let block_service = Arc::clone(&service);
    registry.register(CMD_BLOCK, move |ctx| {
        let Some(block) = &ctx.block else {
            return no_focus(&block_service, PlacementMode::Block);
        };
        block_service.tag_block(block).into()
    });

    let page_service = Arc::clone(&service);
    registry.register(CMD_PAGE, move |ctx| match &ctx.page {
        Some(page) => page_service.tag_page_of(page).into(),
        None => page_service.tag_page().into(),
    });

    registry.register(CMD_SELECTION, move |ctx| {
        let Some(block) = &ctx.block else {
            return no_focus(&service, PlacementMode::Selection);
        };
        service
            .tag_selection(block, ctx.selection.as_deref())
            .into()
    });
}

fn no_focus<P: SuggestionProvider>(
    service: &TaggingService<P>,
    mode: PlacementMode,
) -> CommandOutcome {
    service
        .report(
            mode,
            Err(Error::InvalidInput("no block is being edited".to_string())),
        )
        .into()
}
