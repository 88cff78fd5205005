//! Static rule tables for the rule-based classifier.
//!
//! Everything here is plain data: pattern banks per task type, score
//! boosters, and score reducers. Evaluation lives in
//! [`super::rule_based`]. All regexes are case-insensitive via `(?i)`.
//!
//! ## Tie-break
//!
//! Banks are declared in priority order and carry an explicit `priority`
//! (lower wins). When two banks report the same number of matching
//! signals the lower priority value wins:
//!
//! `code > math > reasoning > analysis > translation > creative > simple_qa`

use super::TaskType;

/// One task-type pattern bank.
#[derive(Debug, Clone, Copy)]
pub struct PatternBank {
    /// Task type this bank votes for.
    pub task_type: TaskType,
    /// Tie-break rank; lower wins.
    pub priority: u8,
    /// Signals; each matching pattern counts once.
    pub patterns: &'static [&'static str],
    /// Reasoning fragment recorded when this bank wins.
    pub reason: &'static str,
}

/// What makes an adjustment fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A case-insensitive regex found anywhere in the prompt.
    Pattern(&'static str),
    /// The trimmed prompt is non-empty and has fewer than this many
    /// characters.
    ShorterThan(usize),
}

/// An additive score adjustment.
#[derive(Debug, Clone, Copy)]
pub struct Adjustment {
    /// Condition.
    pub trigger: Trigger,
    /// Signed delta applied when the trigger fires.
    pub delta: i32,
    /// Reasoning fragment recorded when applied.
    pub reason: &'static str,
}

/// Token estimate above which a prompt earns `+1`.
pub const LONG_PROMPT_TOKENS: usize = 80;
/// Token estimate above which a prompt earns a further `+2`.
pub const VERY_LONG_PROMPT_TOKENS: usize = 200;

/// Task-type banks in tie-break priority order.
///
/// Signals are whole-word matches: `reason` does not fire on `reasoning`
/// and `error` does not fire on `errors`.
pub const PATTERN_BANKS: &[PatternBank] = &[
    PatternBank {
        task_type: TaskType::Code,
        priority: 0,
        patterns: &[
            r"(?i)\b(?:def |class |import |function |const |let |var |=>|async |await )\b",
            r"(?i)\b(?:python|javascript|typescript|java|rust|golang|c\+\+|sql|html|css|react|django|flask|fastapi)\b",
            r"(?i)\b(?:write|build|create|implement|code|debug|fix|refactor|optimise|optimize)\b.*\b(?:function|class|api|app(?:lication)?|script|program|module|endpoint|server|database|query|service|system)\b",
            r"(?i)\b(?:bug|error|exception|traceback|stack\s*trace|segfault|compile|runtime)\b",
            r"```",
        ],
        reason: "code-related keywords detected",
    },
    PatternBank {
        task_type: TaskType::Math,
        priority: 1,
        patterns: &[
            r"(?i)\b(?:solve|calculate|compute|derive|integrate|differentiate|prove|equation|formula)\b",
            r"(?i)\b(?:algebra|calculus|geometry|trigonometry|probability|statistics|linear\s*algebra|matrix|matrices)\b",
            r"[0-9]+\s*[-+*/^]\s*[0-9]+",
            r"(?i)\b(?:sum|product|factorial|logarithm|sqrt|sin|cos|tan)\b",
        ],
        reason: "math/calculation keywords detected",
    },
    PatternBank {
        task_type: TaskType::Reasoning,
        priority: 2,
        patterns: &[
            r"(?i)\b(?:reason|logic|deduc|induc|infer|hypothe|thought\s*experiment|paradox|dilemma)\b",
            r"(?i)\b(?:step\s*by\s*step|chain\s*of\s*thought|think\s*through|work\s*through)\b",
            r"(?i)\b(?:quantum|relativity|philosophy|epistemology|ontology|consciousness)\b",
            r"(?i)\bexplain\s+(?:why|how)\b.*\b(?:complex|advanced|nuanced|detailed)\b",
        ],
        reason: "complex reasoning keywords detected",
    },
    PatternBank {
        task_type: TaskType::Analysis,
        priority: 3,
        patterns: &[
            r"(?i)\b(?:analy[sz]e|compare|contrast|evaluate|assess|critique|review|examine|investigate|discuss)\b",
            r"(?i)\b(?:pros?\s+(?:and|&)\s+cons?|trade\s*-?\s*offs?|implications?|impact)\b",
            r"(?i)\b(?:explain|describe|elaborate)\b.*\b(?:how|why|difference|relationship|impact)\b",
        ],
        reason: "analytical keywords detected",
    },
    PatternBank {
        task_type: TaskType::Translation,
        priority: 4,
        patterns: &[
            concat!(
                r"(?i)\b(?:translat(?:e|ion)|convert)\b.*\b(?:to|into|from)\b.*\b(?:",
                "english|spanish|french|german|chinese|japanese|korean|hindi|arabic|portuguese|russian|italian",
                r")\b"
            ),
            concat!(
                r"(?i)\bin\s+(?:",
                "english|spanish|french|german|chinese|japanese|korean|hindi|arabic|portuguese|russian|italian",
                r")\b"
            ),
        ],
        reason: "translation request detected",
    },
    PatternBank {
        task_type: TaskType::Creative,
        priority: 5,
        patterns: &[
            r"(?i)\b(?:write|compose|create|draft)\b.*\b(?:poem|story|essay|song|lyrics|haiku|limerick|narrative|fiction|blog\s*post|article)\b",
            r"(?i)\b(?:creative|imaginative|poetic|artistic|metaphor|rhyme)\b",
            r"(?i)\b(?:once upon a time|in a world where|dear diary)\b",
        ],
        reason: "creative writing keywords detected",
    },
    PatternBank {
        task_type: TaskType::SimpleQa,
        priority: 6,
        patterns: &[
            r"(?i)^(?:what|who|when|where|which|how\s+many|how\s+much|is|are|was|were|do|does|did|can|could)\b",
            r"(?i)\b(?:define|meaning\s+of|what\s+is|who\s+is|capital\s+of)\b",
        ],
        reason: "simple question pattern detected",
    },
];

/// Score boosters, applied in order.
pub const BOOSTERS: &[Adjustment] = &[
    Adjustment {
        trigger: Trigger::Pattern(
            r"(?i)\b(?:step\s*by\s*step|detailed|comprehensive|thorough|in\s*-?\s*depth)\b",
        ),
        delta: 2,
        reason: "requests detailed/thorough treatment",
    },
    Adjustment {
        trigger: Trigger::Pattern(
            r"(?i)\b(?:compare|contrast|trade\s*-?\s*offs?|pros?\s+(?:and|&)\s+cons?)\b",
        ),
        delta: 1,
        reason: "involves comparison/trade-off analysis",
    },
    Adjustment {
        trigger: Trigger::Pattern(r"(?i)\b(?:explain|why|how\s+does|how\s+do)\b"),
        delta: 1,
        reason: "asks for explanation",
    },
    Adjustment {
        trigger: Trigger::Pattern(r"(?i)\b(?:multiple|several|many|various|different)\b"),
        delta: 1,
        reason: "references multiple items",
    },
    Adjustment {
        trigger: Trigger::Pattern(r"(?i)\b(?:advanced|complex|difficult|challenging|hard)\b"),
        delta: 2,
        reason: "explicitly mentions high difficulty",
    },
    Adjustment {
        trigger: Trigger::Pattern(
            r"(?i)\b(?:error\s*handling|edge\s*case|security|authentication|authoriz)\b",
        ),
        delta: 1,
        reason: "mentions robustness concerns",
    },
    Adjustment {
        trigger: Trigger::Pattern(
            r"(?i)\b(?:architect|design\s*pattern|system\s*design|scalab|distributed)\b",
        ),
        delta: 2,
        reason: "involves architecture/design",
    },
];

/// Score reducers, applied in order after all boosters.
pub const REDUCERS: &[Adjustment] = &[
    Adjustment {
        trigger: Trigger::Pattern(r"(?i)\b(?:simple|basic|easy|quick|brief|short)\b"),
        delta: -1,
        reason: "explicitly simple/basic",
    },
    Adjustment {
        trigger: Trigger::Pattern(r"(?i)\b(?:yes\s+or\s+no|true\s+or\s+false)\b"),
        delta: -2,
        reason: "binary question",
    },
    Adjustment {
        trigger: Trigger::ShorterThan(30),
        delta: -1,
        reason: "very short prompt",
    },
];
