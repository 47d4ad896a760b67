//! Poll-and-auto-select controller.
//!
//! The controller is a plain state machine: user actions and poll ticks
//! produce [`Request`]s, and the runtime feeds the matching [`Response`]s back
//! in. It never performs I/O itself, so every ordering rule can be exercised
//! by handing it responses in whatever order a slow network would.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::fs::listing::{newest_file, Entry, FileContent, Listing};

/// Identifies the poll tick a request descends from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(pub u64);

/// Tag carried by a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListTicket {
    pub generation: Generation,
    pub seq: u64,
}

/// Tag carried by a read request. Only the read with the newest `seq` may
/// update the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTicket {
    pub generation: Generation,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrigin {
    /// Scheduled or user-triggered refresh of the current directory.
    Poll,
    /// User moved to another directory.
    Navigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrigin {
    AutoFollow,
    Manual,
}

/// Work the runtime must perform on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List {
        ticket: ListTicket,
        origin: ListOrigin,
        /// `None` asks for the service's default directory.
        path: Option<PathBuf>,
    },
    Read {
        ticket: ReadTicket,
        origin: ReadOrigin,
        path: PathBuf,
    },
}

/// Completion of a [`Request`].
#[derive(Debug)]
pub enum Response {
    Listed {
        ticket: ListTicket,
        origin: ListOrigin,
        requested: Option<PathBuf>,
        result: Result<Listing>,
    },
    Loaded {
        ticket: ReadTicket,
        origin: ReadOrigin,
        path: PathBuf,
        result: Result<FileContent>,
    },
}

#[cfg(test)]
impl Request {
    /// Build the response for this request from the service's result.
    pub fn listed(self, result: Result<Listing>) -> Option<Response> {
        match self {
            Request::List {
                ticket,
                origin,
                path,
            } => Some(Response::Listed {
                ticket,
                origin,
                requested: path,
                result,
            }),
            Request::Read { .. } => None,
        }
    }

    pub fn loaded(self, result: Result<FileContent>) -> Option<Response> {
        match self {
            Request::Read {
                ticket,
                origin,
                path,
            } => Some(Response::Loaded {
                ticket,
                origin,
                path,
                result,
            }),
            Request::List { .. } => None,
        }
    }
}

/// User-visible mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Following,
    Loading,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Browsing => "PAUSED",
            Mode::Following => "LIVE",
            Mode::Loading => "LOADING",
        }
    }
}

/// How a read response was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Applied,
    /// A newer read was issued after this one; the content was dropped.
    Stale,
    Failed,
}

/// Result of feeding a response to the controller.
#[derive(Debug, Default)]
pub struct Update {
    /// A read the response triggered (auto-follow).
    pub follow_up: Option<Request>,
    /// Set when a read response was applied to the session.
    pub loaded: Option<ReadOrigin>,
}

/// Client-held session state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub current_path: Option<PathBuf>,
    pub entries: Vec<Entry>,
    pub selected_path: Option<PathBuf>,
    pub content: Option<String>,
    pub auto_follow: bool,
    pub last_auto_loaded: Option<PathBuf>,
}

pub struct Controller {
    session: Session,
    generation: Generation,
    next_list_seq: u64,
    applied_list_seq: Option<u64>,
    /// Newest navigation still awaiting its listing.
    pending_nav_seq: Option<u64>,
    next_read_seq: u64,
    latest_read_seq: Option<u64>,
    auto_in_flight: Option<PathBuf>,
    reads_in_flight: usize,
    content_version: u64,
}

impl Controller {
    /// Start a session. `start` of `None` browses the service's default path.
    pub fn new(start: Option<PathBuf>, auto_follow: bool) -> Self {
        Self {
            session: Session {
                current_path: start,
                auto_follow,
                ..Session::default()
            },
            generation: Generation::default(),
            next_list_seq: 0,
            applied_list_seq: None,
            pending_nav_seq: None,
            next_read_seq: 0,
            latest_read_seq: None,
            auto_in_flight: None,
            reads_in_flight: 0,
            content_version: 0,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Bumped every time a read response replaces the displayed content.
    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    pub fn mode(&self) -> Mode {
        if self.reads_in_flight > 0 {
            Mode::Loading
        } else if self.session.auto_follow {
            Mode::Following
        } else {
            Mode::Browsing
        }
    }

    /// The newest file in the displayed listing.
    pub fn latest(&self) -> Option<&Entry> {
        newest_file(&self.session.entries)
    }

    /// One poll tick: list the current directory.
    pub fn poll(&mut self) -> Request {
        self.generation = Generation(self.generation.0 + 1);
        debug!(generation = self.generation.0, "poll tick");
        self.list_request(ListOrigin::Poll, self.session.current_path.clone())
    }

    /// Move to another directory. Takes effect when the listing succeeds.
    pub fn navigate(&mut self, path: &Path) -> Request {
        let request = self.list_request(ListOrigin::Navigate, Some(path.to_path_buf()));
        if let Request::List { ticket, .. } = &request {
            self.pending_nav_seq = Some(ticket.seq);
        }
        request
    }

    /// Move to the parent of the current directory, if there is one.
    pub fn navigate_up(&mut self) -> Option<Request> {
        let parent = self.session.current_path.as_deref()?.parent()?.to_path_buf();
        Some(self.navigate(&parent))
    }

    /// Manually load a file. Does not touch `last_auto_loaded`.
    pub fn select(&mut self, path: &Path) -> Request {
        self.read_request(ReadOrigin::Manual, path.to_path_buf(), self.generation)
    }

    /// Open an entry: directories are navigated into, files are loaded.
    pub fn open(&mut self, entry: &Entry) -> Request {
        if entry.is_directory {
            self.navigate(&entry.path)
        } else {
            self.select(&entry.path)
        }
    }

    /// Enable or disable auto-follow. Enabling compares the displayed
    /// listing against the last auto-loaded path right away.
    pub fn set_auto_follow(&mut self, enabled: bool) -> Option<Request> {
        self.session.auto_follow = enabled;
        info!(enabled, "auto-follow toggled");
        if enabled {
            self.follow_latest(self.generation)
        } else {
            None
        }
    }

    pub fn toggle_auto_follow(&mut self) -> Option<Request> {
        self.set_auto_follow(!self.session.auto_follow)
    }

    /// Feed a completed request back in.
    pub fn apply(&mut self, response: Response) -> Update {
        match response {
            Response::Listed {
                ticket,
                origin,
                requested,
                result,
            } => Update {
                follow_up: self.on_listed(ticket, origin, requested, result),
                loaded: None,
            },
            Response::Loaded {
                ticket,
                origin,
                path,
                result,
            } => {
                let outcome = self.on_read(ticket, origin, &path, result);
                Update {
                    follow_up: None,
                    loaded: (outcome == ReadOutcome::Applied).then_some(origin),
                }
            }
        }
    }

    /// Apply a listing result. Returns the auto-follow read it triggers.
    pub fn on_listed(
        &mut self,
        ticket: ListTicket,
        origin: ListOrigin,
        requested: Option<PathBuf>,
        result: Result<Listing>,
    ) -> Option<Request> {
        let awaited_nav =
            origin == ListOrigin::Navigate && self.pending_nav_seq == Some(ticket.seq);
        if awaited_nav {
            self.pending_nav_seq = None;
        }

        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                warn!(path = ?requested, error = %e, "listing failed");
                return None;
            }
        };

        match origin {
            ListOrigin::Navigate if !awaited_nav => {
                debug!(seq = ticket.seq, "discarding superseded navigation");
                return None;
            }
            ListOrigin::Navigate => {}
            ListOrigin::Poll => {
                if self.pending_nav_seq.is_some() {
                    debug!(seq = ticket.seq, "discarding poll while navigation is pending");
                    return None;
                }
                if self.applied_list_seq.is_some_and(|applied| ticket.seq < applied) {
                    debug!(seq = ticket.seq, "discarding out-of-order listing");
                    return None;
                }
                if requested != self.session.current_path {
                    debug!(path = ?requested, "discarding listing for a directory no longer shown");
                    return None;
                }
            }
        }

        if origin == ListOrigin::Navigate || self.session.current_path.as_ref() != Some(&listing.path)
        {
            info!(path = %listing.path.display(), "browsing directory");
        }
        self.applied_list_seq = Some(ticket.seq);
        self.session.current_path = Some(listing.path);
        self.session.entries = listing.files;

        self.follow_latest(ticket.generation)
    }

    /// Apply a read result.
    pub fn on_read(
        &mut self,
        ticket: ReadTicket,
        origin: ReadOrigin,
        path: &Path,
        result: Result<FileContent>,
    ) -> ReadOutcome {
        self.reads_in_flight = self.reads_in_flight.saturating_sub(1);
        if origin == ReadOrigin::AutoFollow && self.auto_in_flight.as_deref() == Some(path) {
            self.auto_in_flight = None;
        }

        let file = match result {
            Ok(file) => file,
            Err(e) if e.is_not_found() => {
                info!(path = %path.display(), "file disappeared before it could be read");
                return ReadOutcome::Failed;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "read failed");
                return ReadOutcome::Failed;
            }
        };

        if self.latest_read_seq != Some(ticket.seq) {
            debug!(
                path = %path.display(),
                generation = ticket.generation.0,
                "discarding stale read"
            );
            // Still the newest file: count it as followed so a racing manual
            // selection stays until a strictly newer file appears.
            if origin == ReadOrigin::AutoFollow
                && self.latest().is_some_and(|newest| newest.path == path)
            {
                self.session.last_auto_loaded = Some(path.to_path_buf());
            }
            return ReadOutcome::Stale;
        }

        self.session.selected_path = Some(path.to_path_buf());
        self.session.content = Some(file.content);
        if origin == ReadOrigin::AutoFollow {
            self.session.last_auto_loaded = Some(path.to_path_buf());
        }
        self.content_version += 1;
        ReadOutcome::Applied
    }

    fn follow_latest(&mut self, generation: Generation) -> Option<Request> {
        if !self.session.auto_follow {
            return None;
        }
        let newest = newest_file(&self.session.entries)?.path.clone();
        if self.session.last_auto_loaded.as_ref() == Some(&newest)
            || self.auto_in_flight.as_ref() == Some(&newest)
        {
            return None;
        }
        debug!(path = %newest.display(), "newest file changed");
        self.auto_in_flight = Some(newest.clone());
        Some(self.read_request(ReadOrigin::AutoFollow, newest, generation))
    }

    fn list_request(&mut self, origin: ListOrigin, path: Option<PathBuf>) -> Request {
        let seq = self.next_list_seq;
        self.next_list_seq += 1;
        Request::List {
            ticket: ListTicket {
                generation: self.generation,
                seq,
            },
            origin,
            path,
        }
    }

    fn read_request(&mut self, origin: ReadOrigin, path: PathBuf, generation: Generation) -> Request {
        let seq = self.next_read_seq;
        self.next_read_seq += 1;
        self.latest_read_seq = Some(seq);
        self.reads_in_flight += 1;
        Request::Read {
            ticket: ReadTicket { generation, seq },
            origin,
            path,
        }
    }
}
