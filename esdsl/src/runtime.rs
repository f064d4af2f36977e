use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A numeric field the backend computes at query time
///
/// The value is the sum of the `operands` fields; documents missing
/// an operand contribute zero for it instead of being skipped. Derived
/// fields only exist for the duration of the query they are sent with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedField {
    pub name: String,
    pub operands: Vec<String>,
}

impl DerivedField {
    pub fn sum_of<I, S>(name: impl Into<String>, operands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            operands: operands.into_iter().map(Into::into).collect(),
        }
    }

    /// Painless source emitting the sum, zero for missing operands
    pub fn script(&self) -> String {
        if self.operands.is_empty() {
            return "emit(0)".to_owned();
        }

        let terms = self
            .operands
            .iter()
            .map(|field| {
                format!(
                    "(doc['{f}'].size() > 0 ? doc['{f}'].value : 0)",
                    f = field
                )
            })
            .collect::<Vec<_>>();

        format!("emit({})", terms.join(" + "))
    }

    pub fn to_wire(&self) -> Value {
        json!({
            "type": "long",
            "script": { "source": self.script() },
        })
    }
}
