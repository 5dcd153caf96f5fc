//! Notification adapters
//!
//! Each adapter owns the routing and side effects for one message family:
//! chat threads, standalone announcements, and answer-on-air banners. The
//! plugin fans every parsed push batch out to all three.

pub mod announcement;
pub mod answer_on_air;
pub mod chat;

pub use announcement::AnnouncementAdapter;
pub use answer_on_air::AnswerOnAirAdapter;
pub use chat::ChatAdapter;
