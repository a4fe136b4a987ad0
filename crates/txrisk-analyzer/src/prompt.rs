//! Prompt rendering for the reasoning model

/// Instruction preamble and output contract
const ANALYSIS_INSTRUCTIONS: &str = r#"You are a researcher assessing the riskiness of a financial transaction.
Use the context below (sanctions matches, reference summaries and internal
guidance) to judge the sanctions and financial-crime exposure of the parties
involved.

Respond with a single JSON object inside a ```json fenced block. You may
think first inside <think></think> tags. The object must have exactly these
keys:

```json
{
  "sender": "Acme Corporation",
  "receiver": "SovCo Capital Partners",
  "amount": "N/A",
  "currency": "N/A",
  "transactionType": "Funds Transfer",
  "transactionDate": "N/A",
  "riskScore": 65,
  "riskLevel": "Moderate Risk",
  "confidenceScore": 0.95,
  "category": "Corporation",
  "notes": [
    "Entity Type: Corporation, Corporation",
    "Reason: SovCo Capital Partners is not on a sanctions list but is linked to Socombank PJSC, a sanctioned entity.",
    "Conclusion: Indirect exposure to sanctioned entities; review before release."
  ]
}
```

Rules:
- Use "N/A" for any text field you cannot determine.
- riskScore is an integer from 0 to 100.
- confidenceScore is a number from 0.0 to 1.0.
- notes is a list of strings."#;

/// Builds the analysis prompt
pub struct PromptBuilder<'a> {
    context: &'a str,
    transaction: &'a str,
    correction: Option<String>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for one transaction
    pub fn new(context: &'a str, transaction: &'a str) -> Self {
        Self {
            context,
            transaction,
            correction: None,
        }
    }

    /// Ask the model to fix a previous reply that broke the schema
    pub fn with_correction(mut self, violation: impl Into<String>) -> Self {
        self.correction = Some(violation.into());
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(
            ANALYSIS_INSTRUCTIONS.len() + self.context.len() + self.transaction.len() + 256,
        );

        prompt.push_str(ANALYSIS_INSTRUCTIONS);
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(self.context);
        prompt.push_str("\n\nTransaction:\n");
        prompt.push_str(self.transaction);
        prompt.push('\n');

        if let Some(violation) = &self.correction {
            prompt.push_str("\nYour previous reply did not follow the required format: ");
            prompt.push_str(violation);
            prompt.push_str(
                "\nReply again with one ```json fenced block containing every key listed above, \
                 using the stated types.\n",
            );
        }

        prompt
    }
}
