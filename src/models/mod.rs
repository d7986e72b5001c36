pub mod custom_field_definition;
pub mod custom_field_value;
pub mod ticket;
pub mod ticket_category;
pub mod ticket_history;
pub mod ticket_note;
pub mod ticket_subcategory;
pub mod user;

pub use custom_field_definition::{
    Entity as CustomFieldDefinition, FieldType, Model as CustomFieldDefinitionModel,
};
pub use custom_field_value::{Entity as CustomFieldValue, Model as CustomFieldValueModel};
pub use ticket::{Entity as Ticket, Model as TicketModel, TicketPriority, TicketStatus};
pub use ticket_category::{Entity as TicketCategory, Model as TicketCategoryModel};
pub use ticket_history::{Entity as TicketHistory, HistoryAction, Model as TicketHistoryModel};
pub use ticket_note::{Entity as TicketNote, Model as TicketNoteModel};
pub use ticket_subcategory::{Entity as TicketSubcategory, Model as TicketSubcategoryModel};
pub use user::{Entity as User, Model as UserModel, UserRole};
