pub mod boosting;
pub mod classifier_trait;
pub mod decision_tree;
pub mod distribution;
pub mod voting;

pub use boosting::GradientBoostedClassifier;
pub use classifier_trait::ClassifierModel;
pub use decision_tree::DecisionTreeClassifier;
pub use distribution::ClassProbabilityDistribution;
pub use voting::VotingEnsemble;
