#![forbid(unsafe_code)]

pub mod ids {
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct BranchId(String);

    impl BranchId {
        pub fn as_str(&self) -> &str {
            &self.0
        }

        /// Path segments of the branch id, in order. Never empty for a valid id.
        pub fn segments(&self) -> impl Iterator<Item = &str> {
            self.0.split('/')
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, BranchIdError> {
            let value = value.into();
            validate_branch_id(&value)?;
            Ok(Self(value))
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum BranchIdError {
        Empty,
        TooLong,
        InvalidFirstChar,
        InvalidChar { ch: char, index: usize },
        EmptySegment,
        DotSegment,
    }

    impl std::fmt::Display for BranchIdError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Empty => write!(f, "branch id must not be empty"),
                Self::TooLong => write!(f, "branch id must be at most 128 chars"),
                Self::InvalidFirstChar => {
                    write!(f, "branch id must start with an ascii letter or digit")
                }
                Self::InvalidChar { ch, index } => {
                    write!(f, "branch id has invalid char {ch:?} at index {index}")
                }
                Self::EmptySegment => write!(f, "branch id must not contain empty path segments"),
                Self::DotSegment => write!(f, "branch id segments must not be '.' or '..'"),
            }
        }
    }

    impl std::error::Error for BranchIdError {}

    fn validate_branch_id(value: &str) -> Result<(), BranchIdError> {
        if value.is_empty() {
            return Err(BranchIdError::Empty);
        }
        if value.chars().count() > 128 {
            return Err(BranchIdError::TooLong);
        }
        let mut chars = value.chars();
        let Some(first) = chars.next() else {
            return Err(BranchIdError::Empty);
        };
        if !first.is_ascii_alphanumeric() {
            return Err(BranchIdError::InvalidFirstChar);
        }
        for (index, ch) in value.chars().enumerate() {
            if index == 0 {
                continue;
            }
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '/' | '-') {
                continue;
            }
            return Err(BranchIdError::InvalidChar { ch, index });
        }
        for segment in value.split('/') {
            if segment.is_empty() {
                return Err(BranchIdError::EmptySegment);
            }
            if segment == "." || segment == ".." {
                return Err(BranchIdError::DotSegment);
            }
        }
        Ok(())
    }
}

pub mod scaffold {
    /// Bumped when the scaffold text changes shape; recorded in the meta sidecar.
    pub const SCAFFOLD_VERSION: i64 = 1;

    /// The heading every unconfigured document carries. The scaffold tells the
    /// editor to remove the whole instructions section, so presence of this
    /// exact line is the classification rule.
    pub const STATUS_HEADING: &str = "## Status: NEEDS CONFIGURATION";

    pub const SCAFFOLD: &str = "\
# MEMORY_BANK Branch System Prompt

> Auto-created by branch prompt loader. Customize for your branch.

## Status: NEEDS CONFIGURATION

This branch system prompt needs customization.

### What This Does
- Injected into every conversation in this branch
- Provides branch-specific context and reminders
- Keep it concise (50-150 tokens)

### Template

Replace everything above with your content:

<!-- What this branch is for, in one or two sentences. -->

**Constraints:**
- <!-- Rules every conversation in this branch must follow. -->

**Key commands:**
- <!-- Commands or references worth keeping at hand. -->

### After Customizing
Remove this entire instructions section. Keep only your branch context.
";

    pub fn render_scaffold() -> String {
        SCAFFOLD.to_string()
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum PromptStatus {
        Configured,
        NeedsConfiguration,
    }

    impl PromptStatus {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Configured => "configured",
                Self::NeedsConfiguration => "needs_configuration",
            }
        }
    }

    pub fn classify(content: &str) -> PromptStatus {
        let unconfigured = content.lines().any(|line| line.trim() == STATUS_HEADING);
        if unconfigured {
            PromptStatus::NeedsConfiguration
        } else {
            PromptStatus::Configured
        }
    }
}

pub mod budget {
    /// Advisory authoring window for a configured branch prompt, in tokens.
    pub const MIN_PROMPT_TOKENS: usize = 50;
    pub const MAX_PROMPT_TOKENS: usize = 150;

    /// Rough estimate: one token per four chars. Advisory only, never enforced.
    pub fn estimate_tokens(text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct BudgetReport {
        pub min_tokens: usize,
        pub max_tokens: usize,
        pub estimated_tokens: usize,
        pub exceeded: bool,
    }

    pub fn check(text: &str) -> BudgetReport {
        let estimated_tokens = estimate_tokens(text);
        BudgetReport {
            min_tokens: MIN_PROMPT_TOKENS,
            max_tokens: MAX_PROMPT_TOKENS,
            estimated_tokens,
            exceeded: estimated_tokens > MAX_PROMPT_TOKENS,
        }
    }
}

pub mod prepare {
    use crate::budget::{self, BudgetReport};
    use crate::scaffold::PromptStatus;

    #[derive(Clone, Debug)]
    pub struct PreparedContext {
        pub text: String,
        pub budget: BudgetReport,
    }

    impl PreparedContext {
        pub fn is_empty(&self) -> bool {
            self.text.is_empty()
        }
    }

    /// Gate content for injection. Unconfigured documents inject nothing so
    /// the instructional scaffold never reaches a live conversation;
    /// configured content passes through unchanged with an advisory budget
    /// check attached.
    pub fn prepare(status: PromptStatus, content: &str) -> PreparedContext {
        match status {
            PromptStatus::NeedsConfiguration => PreparedContext {
                text: String::new(),
                budget: budget::check(""),
            },
            PromptStatus::Configured => PreparedContext {
                text: content.to_string(),
                budget: budget::check(content),
            },
        }
    }
}
