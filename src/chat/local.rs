//! Offline keyword responder used when the API is unavailable.

const MODEL_ANSWER: &str = "The loan debugger uses an ensemble of decision trees, each fit on a \
bootstrap resample of the training data. Every tree votes on the application and the majority \
label becomes the prediction.";

const FEATURE_ANSWER: &str = "The most important features for loan approval prediction are:
1. Credit History - a good credit history significantly increases approval chances
2. Applicant Income - higher income correlates with higher approval rates
3. Loan Amount - smaller loan amounts are more likely to be approved
4. Property Area - urban and semi-urban properties have higher approval rates
Run `loan-debugger importance` for the scores of the loaded model.";

const ACCURACY_ANSWER: &str = "Accuracy is measured on a held-out 20% of the training data and \
logged when the model is trained. Retrain with `loan-debugger train --force` to see it again.";

const IMPROVE_ANSWER: &str = "To improve prediction accuracy, you could:
1. Collect more training data, especially for rejected loans
2. Add features such as debt-to-income ratio
3. Tune the ensemble size and tree depth
4. Engineer more informative features from the existing columns";

const REJECTED_ANSWER: &str = "Loans are typically rejected for these main reasons:
1. Poor credit history
2. Low income relative to loan amount
3. High existing debt
4. Insufficient loan term for the requested amount
5. Property location in areas with higher default rates";

const APPROVED_ANSWER: &str = "To increase chances of loan approval:
1. Maintain good credit history
2. Apply for a loan amount appropriate to your income
3. Have a co-applicant with good income
4. Choose a longer loan term if possible
5. Provide all documentation completely and accurately";

const DEFAULT_ANSWER: &str = "I'm currently in local mode and can answer basic questions about \
the loan prediction model: how it works, important features, model performance, and ways to \
improve predictions. What would you like to know?";

/// Ordered keyword rules; the first match wins.
const RULES: [(&[&str], &str); 6] = [
    (&["model", "algorithm", "classifier"], MODEL_ANSWER),
    (&["important", "feature", "factor"], FEATURE_ANSWER),
    (&["accuracy", "performance", "accurate"], ACCURACY_ANSWER),
    (&["improve", "better", "enhance"], IMPROVE_ANSWER),
    (&["rejected", "denied", "not approved"], REJECTED_ANSWER),
    (&["approved", "accepted", "get approved"], APPROVED_ANSWER),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResponder;

impl LocalResponder {
    pub fn respond(&self, query: &str) -> &'static str {
        let query = query.to_lowercase();
        RULES
            .iter()
            .find(|(words, _)| words.iter().any(|w| query.contains(w)))
            .map(|(_, answer)| *answer)
            .unwrap_or(DEFAULT_ANSWER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_pick_answers() {
        let r = LocalResponder;
        assert_eq!(r.respond("Which ALGORITHM is used?"), MODEL_ANSWER);
        assert_eq!(r.respond("what factors matter"), FEATURE_ANSWER);
        assert_eq!(r.respond("how accurate is it"), ACCURACY_ANSWER);
        assert_eq!(r.respond("why was my loan denied"), REJECTED_ANSWER);
        assert_eq!(r.respond("how do I get accepted"), APPROVED_ANSWER);
        assert_eq!(r.respond("hello"), DEFAULT_ANSWER);
    }

    #[test]
    fn earlier_rules_win() {
        // mentions both "model" and "rejected"
        assert_eq!(
            LocalResponder.respond("why does the model say rejected"),
            MODEL_ANSWER
        );
        // "not approved" is checked before "approved"
        assert_eq!(LocalResponder.respond("not approved again"), REJECTED_ANSWER);
    }
}
