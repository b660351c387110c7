//! GSN element model.
//!
//! Element kinds follow the core elements of the GSN Community Standard v3:
//! goals (claims), strategies (inference rules), solutions (evidence) and the
//! context, assumption and justification nodes (axioms).

use std::fmt;

/// Default motivation text for elements that do not declare one.
pub const NO_MOTIVATION: &str = "No motivation available.";

/// Type of a GSN element. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GsnType {
    Goal,
    Strategy,
    Solution,
    Context,
    Justification,
    Assumption,
}

impl GsnType {
    pub const ALL: [GsnType; 6] = [
        GsnType::Goal,
        GsnType::Strategy,
        GsnType::Solution,
        GsnType::Context,
        GsnType::Justification,
        GsnType::Assumption,
    ];

    /// Conventional label prefix (`G1`, `S2`, `Sn3`, ...).
    pub fn label_prefix(self) -> &'static str {
        match self {
            GsnType::Goal => "G",
            GsnType::Strategy => "S",
            GsnType::Solution => "Sn",
            GsnType::Context => "C",
            GsnType::Justification => "J",
            GsnType::Assumption => "A",
        }
    }

    /// Resolves a type from a conventional label prefix. `Sn` wins over `S`.
    pub fn from_label_prefix(label: &str) -> Option<GsnType> {
        if label.starts_with("Sn") {
            return Some(GsnType::Solution);
        }
        match label.chars().next()? {
            'G' => Some(GsnType::Goal),
            'S' => Some(GsnType::Strategy),
            'C' => Some(GsnType::Context),
            'J' => Some(GsnType::Justification),
            'A' => Some(GsnType::Assumption),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GsnType::Goal => "Goal",
            GsnType::Strategy => "Strategy",
            GsnType::Solution => "Solution",
            GsnType::Context => "Context",
            GsnType::Justification => "Justification",
            GsnType::Assumption => "Assumption",
        }
    }

    /// Context, justification and assumption nodes.
    pub fn is_axiom(self) -> bool {
        matches!(
            self,
            GsnType::Context | GsnType::Justification | GsnType::Assumption
        )
    }

    /// Types that compile to parentless network variables (evidence and axioms).
    pub fn is_root_variable(self) -> bool {
        self == GsnType::Solution || self.is_axiom()
    }

    /// Name of the positive network state: `sound` for strategies, `sat` otherwise.
    pub fn positive_state(self) -> &'static str {
        match self {
            GsnType::Strategy => "sound",
            _ => "sat",
        }
    }

    pub fn negative_state(self) -> &'static str {
        match self {
            GsnType::Strategy => "notSound",
            _ => "notSat",
        }
    }

    /// Both state names, positive first.
    pub fn state_names(self) -> [&'static str; 2] {
        [self.positive_state(), self.negative_state()]
    }
}

impl fmt::Display for GsnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extension fields carried by an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementData {
    /// Prior probability of the positive state for root variables.
    pub belief: Option<f64>,
}

/// One node of a GSN argument.
#[derive(Debug, Clone, PartialEq)]
pub struct GsnElement {
    label: String,
    intent: String,
    element_type: GsnType,
    motivation: Option<String>,
    /// Labels of the elements this one is supported by.
    pub supporters: Vec<String>,
    /// Labels of the elements this one is in context of.
    pub contexts: Vec<String>,
    pub data: ElementData,
}

impl GsnElement {
    pub fn new(label: impl Into<String>, intent: impl Into<String>, element_type: GsnType) -> Self {
        Self {
            label: label.into(),
            intent: intent.into(),
            element_type,
            motivation: None,
            supporters: Vec::new(),
            contexts: Vec::new(),
            data: ElementData::default(),
        }
    }

    pub fn with_supporters<I, S>(mut self, supporters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supporters = supporters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_contexts<I, S>(mut self, contexts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contexts = contexts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_motivation(mut self, motivation: impl Into<String>) -> Self {
        self.motivation = Some(motivation.into());
        self
    }

    /// Sets the declared belief. Range is checked when the tree is built.
    pub fn with_belief(mut self, belief: f64) -> Self {
        self.data.belief = Some(belief);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    pub fn element_type(&self) -> GsnType {
        self.element_type
    }

    pub fn motivation(&self) -> &str {
        self.motivation.as_deref().unwrap_or(NO_MOTIVATION)
    }

    pub fn belief(&self) -> Option<f64> {
        self.data.belief
    }

    /// Supporters followed by contexts, in declaration order.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.supporters
            .iter()
            .chain(self.contexts.iter())
            .map(String::as_str)
    }
}
