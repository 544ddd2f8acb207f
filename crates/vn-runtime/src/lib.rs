pub mod config;
pub mod context;
pub mod eval;
mod helpers;
pub mod interface;
pub mod namespace;
pub mod node;
pub mod params;
mod reachability;
pub mod script;
pub mod scry;
pub mod session;
pub mod statements;
pub mod translation;

pub use config::{ErrorPolicy, SessionConfig, SessionHooks, DEFAULT_LOOP_GUARD};
pub use context::{ExecutionContext, PendingArguments, ReturnFrame};
pub use eval::{Evaluator, RhaiEvaluator};
pub use interface::{
    ChoiceItem, HeadlessInterface, Interface, MenuRequest, PredictedAsset, PredictionCache,
    SayRequest, ShowRequest,
};
pub use namespace::{MapNamespace, SpecialNamespace, SpecialNamespaces, Store, Stores};
pub use node::{DiffInfo, Node, NodeId, NodeKind};
pub use script::{Script, Translator};
pub use scry::{ExtendText, Scry};
pub use session::{
    SavedContext, Session, SessionOptions, SessionSnapshot, SNAPSHOT_SCHEMA,
};
pub use statements::{ReachableInfo, StatementEnv, StatementRegistry, UserStatementKind};
pub use translation::{PersistentState, TranslationCounters};
