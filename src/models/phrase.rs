use serde::Serialize;

/// One entry of the motivational phrase deck. The deck is immutable at
/// runtime; each student keeps a rotation cursor into it.
#[derive(Debug, Clone, Serialize)]
pub struct Phrase {
    pub id: i64,
    pub category: String, // "cheer" | "quote"
    pub text: String,
    pub author: Option<String>,
    pub lifespan: Option<String>,
}

impl Phrase {
    /// Render for the student-facing terminal. Quotes carry their
    /// author attribution; plain cheers are shown as-is.
    pub fn render(&self) -> String {
        if self.category == "quote" {
            if let Some(author) = self.author.as_deref() {
                let mut out = format!("\"{}\" - {}", self.text, author);
                if let Some(span) = self.lifespan.as_deref() {
                    out.push(' ');
                    out.push_str(span);
                }
                return out;
            }
        }
        self.text.clone()
    }
}
