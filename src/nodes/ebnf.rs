use crate::grammar::{Grammar, NodeId};
use crate::nodes::{GroupMode, Node};

impl Grammar {
    /// EBNF-style rendering of one node, used in "expected ..." diagnostics.
    /// Record and union references render as their bare names, so recursive
    /// grammars render finitely.
    pub fn ebnf(&self, id: NodeId) -> String {
        match self.node(id) {
            Node::Sequence { items } => items
                .iter()
                .map(|i| self.ebnf(*i))
                .collect::<Vec<_>>()
                .join(" "),
            Node::Disjunction { alts, .. } => alts
                .iter()
                .map(|a| self.ebnf(*a))
                .collect::<Vec<_>>()
                .join(" | "),
            Node::Group { expr, mode } => {
                let suffix = match mode {
                    GroupMode::Once => "",
                    GroupMode::ZeroOrOne => "?",
                    GroupMode::ZeroOrMore => "*",
                    GroupMode::OneOrMore => "+",
                    GroupMode::NonEmpty => "!",
                };
                format!("({}){}", self.ebnf(*expr), suffix)
            }
            Node::Lookahead { expr, negative } => {
                let op = if *negative { "?!" } else { "?=" };
                format!("({} {})", op, self.ebnf(*expr))
            }
            Node::Negation { expr } => format!("!{}", self.ebnf(*expr)),
            Node::Literal { value, ty_name, .. } => match ty_name {
                Some(ty) => format!("{:?}:{}", value, ty),
                None => format!("{:?}", value),
            },
            Node::Reference { name, .. } => name.clone(),
            Node::Capture { expr, .. } => self.ebnf(*expr),
            Node::Record { def, .. } => self.record_def(*def).name().to_string(),
            Node::Union { def, .. } => self.union_def(*def).name().to_string(),
            Node::Custom { name, .. } | Node::Parseable { name, .. } => name.clone(),
        }
    }

    /// Render every record production of the grammar, one per line.
    pub fn ebnf_grammar(&self) -> String {
        let mut lines = Vec::new();
        for node in &self.nodes {
            if let Node::Record { def, expr } = node {
                lines.push(format!(
                    "{} = {} .",
                    self.record_def(*def).name(),
                    self.ebnf(*expr)
                ));
            }
        }
        lines.join("\n")
    }
}
