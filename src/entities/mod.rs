pub mod activity_log;
pub mod alert;
pub mod alert_action;
pub mod alert_configuration;
pub mod alert_state;
pub mod alert_type;
pub mod context_snapshot;
pub mod nutrition_log;
pub mod priority_level;
pub mod weight_entry;

pub use activity_log::Entity as ActivityLog;
pub use alert::Entity as Alert;
pub use alert_action::Entity as AlertAction;
pub use alert_configuration::Entity as AlertConfiguration;
pub use alert_state::Entity as AlertState;
pub use alert_type::Entity as AlertType;
pub use context_snapshot::Entity as ContextSnapshot;
pub use nutrition_log::Entity as NutritionLog;
pub use priority_level::Entity as PriorityLevel;
pub use weight_entry::Entity as WeightEntry;
