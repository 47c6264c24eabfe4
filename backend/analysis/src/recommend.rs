//! Recommendation synthesis from ranked clauses.

use tenantlens_core::{ClauseFinding, Severity};

pub const STANDARD_LEASE: &str =
    "Your lease appears to be fairly standard. Review it carefully and keep a copy for your records.";

pub const URGENT: &str = "🚨 URGENT: This lease contains potentially illegal clauses. Consider consulting with a tenant rights organization or legal aid before signing.";

pub const MULTIPLE_CONCERNS: &str = "⚠️ Multiple concerning clauses found. Document everything and consider negotiating with your landlord.";

pub const GENERAL_ADVICE: [&str; 4] = [
    "📋 Keep detailed records of all communications with your landlord",
    "📞 Know your local tenant rights hotline number",
    "💰 Understand your security deposit rights",
    "🏠 Take photos of the property condition before moving in",
];

/// Clause count at which the "multiple concerns" advice applies.
pub const MULTIPLE_THRESHOLD: usize = 3;

pub fn recommendations(clauses: &[ClauseFinding]) -> Vec<String> {
    if clauses.is_empty() {
        return vec![STANDARD_LEASE.to_string()];
    }

    let mut out = Vec::with_capacity(2 + GENERAL_ADVICE.len());
    if clauses.iter().any(|c| c.severity == Severity::High) {
        out.push(URGENT.to_string());
    }
    if clauses.len() >= MULTIPLE_THRESHOLD {
        out.push(MULTIPLE_CONCERNS.to_string());
    }
    out.extend(GENERAL_ADVICE.iter().map(|s| s.to_string()));
    out
}
