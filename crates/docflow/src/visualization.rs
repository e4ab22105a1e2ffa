//! State machine visualization for the approval workflow.
//!
//! [`StateMachineDefinition::from_table`] expands the transition table into
//! one edge per `(from, to, action)` and renders it for Mermaid or Graphviz.
//!
//! # Example
//!
//! ```
//! use docflow::{StageRegistry, StateMachineDefinition};
//!
//! let definition = StateMachineDefinition::from_table(&StageRegistry::standard());
//! let mermaid = definition.to_mermaid();
//!
//! assert!(mermaid.contains("Draft --> Submitted : Submit (User)"));
//! assert!(mermaid.contains("Completed --> [*]"));
//! ```

use crate::role::Role;
use crate::stage::{Stage, StageRegistry};
use crate::transition::{RULES, TransitionKind};

/// Static state machine definition for visualization tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineDefinition {
    /// All states, in registry order.
    pub states: Vec<StateDefinition>,

    /// One entry per edge of the graph.
    pub transitions: Vec<TransitionDefinition>,

    /// The state every document is created in.
    pub initial_state: String,
}

/// A state in the state machine definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDefinition {
    /// Stage id, used as the node name.
    pub name: String,

    /// Display label.
    pub label: String,

    /// Whether no transition leaves this state.
    pub is_terminal: bool,
}

impl StateDefinition {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            is_terminal: false,
        }
    }

    /// Mark as terminal state.
    pub fn terminal(mut self) -> Self {
        self.is_terminal = true;
        self
    }
}

/// A transition in the state machine definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDefinition {
    pub from: String,
    pub to: String,

    /// Action name, as shown on its button.
    pub action: String,

    /// Labels of the roles allowed to take the action.
    pub roles: Vec<String>,

    /// Whether this edge sends the document back for rework.
    pub is_reject: bool,
}

impl TransitionDefinition {
    pub fn new(from: impl Into<String>, to: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            action: action.into(),
            roles: vec![],
            is_reject: false,
        }
    }

    /// Add a role allowed to take this transition.
    pub fn with_role(mut self, role: Role) -> Self {
        self.roles.push(role.as_str().to_owned());
        self
    }

    pub fn reject(mut self) -> Self {
        self.is_reject = true;
        self
    }

    /// Edge label: action followed by the allowed roles.
    pub fn label(&self) -> String {
        if self.roles.is_empty() {
            self.action.clone()
        } else {
            format!("{} ({})", self.action, self.roles.join(", "))
        }
    }
}

impl StateMachineDefinition {
    /// Create an empty state machine definition.
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            states: vec![],
            transitions: vec![],
            initial_state: initial_state.into(),
        }
    }

    /// The full workflow graph, with labels from `registry`.
    pub fn from_table(registry: &StageRegistry) -> Self {
        let states = registry.entries().iter().map(|entry| {
            let state = StateDefinition::new(entry.id.as_str(), entry.display_label.as_str());
            if registry.is_terminal(entry.id) {
                state.terminal()
            } else {
                state
            }
        });

        let transitions = RULES.iter().flat_map(|rule| {
            rule.from.iter().map(move |&from| {
                let edge = TransitionDefinition::new(from.as_str(), rule.to.as_str(), rule.action);
                let edge = rule.roles.iter().fold(edge, |edge, &role| edge.with_role(role));
                match rule.kind {
                    TransitionKind::Forward => edge,
                    TransitionKind::Reject => edge.reject(),
                }
            })
        });

        Self {
            states: states.collect(),
            transitions: transitions.collect(),
            initial_state: Stage::Draft.as_str().to_owned(),
        }
    }

    /// Add a state.
    pub fn with_state(mut self, state: StateDefinition) -> Self {
        self.states.push(state);
        self
    }

    /// Add a transition.
    pub fn with_transition(mut self, transition: TransitionDefinition) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Generate a Mermaid state diagram.
    ///
    /// # Example Output
    ///
    /// ```text
    /// stateDiagram-v2
    ///     state "In Review" as Review
    ///     [*] --> Draft
    ///     Draft --> Submitted : Submit (User)
    ///     Submitted --> Review : Start review (Accountant)
    ///     Review --> Rejected : Reject (Accountant, Manager)
    ///     Completed --> [*]
    /// ```
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["stateDiagram-v2".to_string()];

        for s in &self.states {
            if s.label != s.name {
                lines.push(format!("    state \"{}\" as {}", s.label, s.name));
            }
        }

        lines.push(format!("    [*] --> {}", self.initial_state));

        for t in &self.transitions {
            lines.push(format!("    {} --> {} : {}", t.from, t.to, t.label()));
        }

        for s in &self.states {
            if s.is_terminal {
                lines.push(format!("    {} --> [*]", s.name));
            }
        }

        lines.join("\n")
    }

    /// Generate a DOT graph for Graphviz.
    ///
    /// Reject edges are drawn dashed.
    ///
    /// # Example Output
    ///
    /// ```text
    /// digraph workflow {
    ///     rankdir=LR;
    ///     node [shape=box];
    ///
    ///     Review [label="In Review"];
    ///
    ///     Draft -> Submitted [label="Submit (User)"];
    ///     Review -> Rejected [label="Reject (Accountant, Manager)", style=dashed];
    ///
    ///     Completed [shape=doublecircle];
    /// }
    /// ```
    pub fn to_dot(&self) -> String {
        let mut lines = vec![
            "digraph workflow {".to_string(),
            "    rankdir=LR;".to_string(),
            "    node [shape=box];".to_string(),
            "".to_string(),
        ];

        for s in &self.states {
            if s.label != s.name {
                lines.push(format!("    {} [label=\"{}\"];", s.name, s.label));
            }
        }
        lines.push("".to_string());

        for t in &self.transitions {
            let style = if t.is_reject { ", style=dashed" } else { "" };
            lines.push(format!(
                "    {} -> {} [label=\"{}\"{}];",
                t.from,
                t.to,
                t.label(),
                style
            ));
        }

        lines.push("".to_string());
        for s in &self.states {
            if s.is_terminal {
                lines.push(format!("    {} [shape=doublecircle];", s.name));
            }
        }

        lines.push("}".to_string());
        lines.join("\n")
    }
}
