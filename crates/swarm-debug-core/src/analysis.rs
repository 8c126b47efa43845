//! Requests handed to the analysis backend.

use std::fmt::Write as _;

use crate::model::Findings;

/// What a worker is being asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisRequest {
    /// Analyse the issue given the findings of workers dispatched earlier
    /// in the same session.
    Investigate { issue: String, findings: Findings },
    /// Merge every worker's result into one solution.
    Synthesize { results: Findings },
}

impl AnalysisRequest {
    /// Findings visible to the worker receiving this request.
    #[must_use]
    pub const fn findings(&self) -> &Findings {
        match self {
            Self::Investigate { findings, .. } => findings,
            Self::Synthesize { results } => results,
        }
    }

    #[must_use]
    pub const fn is_synthesis(&self) -> bool {
        matches!(self, Self::Synthesize { .. })
    }

    /// Render the prompt text sent to the backend.
    #[must_use]
    pub fn render_prompt(&self) -> String {
        let mut prompt = String::new();
        match self {
            Self::Investigate { issue, findings } => {
                let _ = writeln!(prompt, "DEBUGGING CONTEXT:");
                let _ = writeln!(prompt, "Issue: {}", issue.trim());
                let _ = writeln!(prompt);
                let _ = writeln!(prompt, "Previous findings from other agents:");
                let _ = writeln!(prompt, "{}", render_findings(findings));
                let _ = writeln!(prompt);
                let _ = writeln!(
                    prompt,
                    "Analyze this issue from your specialty and provide:\n\
                     1. Root cause analysis\n\
                     2. Specific recommendations\n\
                     3. Code fixes or configuration changes\n\
                     4. Testing strategy\n\
                     5. Coordination notes for other agents"
                );
            }
            Self::Synthesize { results } => {
                let _ = writeln!(
                    prompt,
                    "Based on the following analysis from specialized agents:"
                );
                let _ = writeln!(prompt);
                let _ = writeln!(prompt, "{}", render_findings(results));
                let _ = writeln!(prompt);
                let _ = writeln!(
                    prompt,
                    "Generate a coordinated solution that:\n\
                     1. Addresses the root cause\n\
                     2. Provides step-by-step implementation\n\
                     3. Includes testing verification\n\
                     4. Considers system-wide impacts\n\
                     5. Keeps frontend, backend and system changes consistent"
                );
            }
        }
        prompt
    }
}

fn render_findings(findings: &Findings) -> String {
    serde_json::to_string_pretty(findings).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use crate::model::AgentOutcome;

    use super::*;

    #[test]
    fn test_investigate_prompt_carries_issue_and_findings() {
        let mut findings = Findings::new();
        findings.insert("FrontendDebugger", AgentOutcome::Completed("flexbox gap".into()));
        let request = AnalysisRequest::Investigate {
            issue: "  tab bar broken  ".into(),
            findings,
        };

        let prompt = request.render_prompt();
        assert!(prompt.contains("Issue: tab bar broken\n"));
        assert!(prompt.contains("\"FrontendDebugger\": \"flexbox gap\""));
        assert!(!request.is_synthesis());
    }

    #[test]
    fn test_investigate_prompt_with_no_findings() {
        let request = AnalysisRequest::Investigate {
            issue: "crash".into(),
            findings: Findings::new(),
        };
        assert!(request.render_prompt().contains("agents:\n{}\n"));
    }

    #[test]
    fn test_synthesis_prompt_lists_results() {
        let mut results = Findings::new();
        results.insert("TestCoordinator", AgentOutcome::Failed("timeout".into()));
        let request = AnalysisRequest::Synthesize { results };

        assert!(request.is_synthesis());
        assert!(request
            .render_prompt()
            .contains("\"TestCoordinator\": \"Error: timeout\""));
    }
}
