//! Out-of-band room messages.

use dibs_protocol::RoomName;
use tokio::sync::mpsc;

/// A message for a room that isn't a reply to any command, such as a
/// grace window running out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub room: RoomName,
    pub text: String,
}

pub type AnnouncementSender = mpsc::UnboundedSender<Announcement>;
pub type AnnouncementReceiver = mpsc::UnboundedReceiver<Announcement>;

/// Creates the channel a transport drains to post announcements.
pub fn announcement_channel() -> (AnnouncementSender, AnnouncementReceiver) {
    mpsc::unbounded_channel()
}
