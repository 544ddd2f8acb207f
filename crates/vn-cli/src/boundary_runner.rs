use std::cell::RefCell;
use std::rc::Rc;

use vn_core::{VnError, VnValue};
use vn_runtime::{
    Interface, MenuRequest, SayRequest, Session, SessionSnapshot, TranslationCounters,
};

use crate::{json_string, BoundaryEvent, BoundaryResult, Line};

pub(crate) const CHOICE_PENDING: &str = "CLI_CHOICE_PENDING";

#[derive(Debug, Default)]
pub(crate) struct Transcript {
    pub(crate) lines: Vec<Line>,
    pub(crate) choices: Vec<(usize, String)>,
}

/// Collects dialogue and answers at most one menu. A second menu stops the
/// session so the caller can save and ask for the next choice.
pub(crate) struct AgentInterface {
    transcript: Rc<RefCell<Transcript>>,
    choice: Option<usize>,
    /// Dialogue before the pending menu was already shown by the previous run.
    replaying: bool,
}

impl AgentInterface {
    pub(crate) fn new(choice: Option<usize>) -> (Self, Rc<RefCell<Transcript>>) {
        let transcript = Rc::new(RefCell::new(Transcript::default()));
        (
            Self {
                transcript: Rc::clone(&transcript),
                replaying: choice.is_some(),
                choice,
            },
            transcript,
        )
    }
}

pub(crate) fn display_name(who: &VnValue) -> Option<String> {
    match who {
        VnValue::Null => None,
        VnValue::String(name) => Some(name.clone()),
        VnValue::Map(fields) => fields
            .get("name")
            .and_then(VnValue::as_string)
            .map(str::to_string),
        other => serde_json::to_string(other).ok(),
    }
}

impl Interface for AgentInterface {
    fn say(&mut self, request: &SayRequest) -> Result<(), VnError> {
        if self.replaying {
            return Ok(());
        }
        self.transcript.borrow_mut().lines.push(Line {
            who: request.who.as_ref().and_then(display_name),
            what: request.what.clone(),
        });
        Ok(())
    }

    fn choose(&mut self, request: &MenuRequest) -> Result<Option<usize>, VnError> {
        self.replaying = false;
        if let Some(choice) = self.choice.take() {
            return Ok(Some(choice));
        }
        self.transcript.borrow_mut().choices = request
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.item.is_some())
            .map(|(index, item)| (index, item.caption.clone()))
            .collect();
        Err(VnError::usage(CHOICE_PENDING, "The menu is waiting for a choice."))
    }
}

/// Steps until the script ends or a menu needs an answer. The snapshot
/// returned for a menu is taken right before it, so resuming replays it.
pub(crate) fn run_to_boundary(
    session: &mut Session,
    transcript: &Rc<RefCell<Transcript>>,
) -> Result<(BoundaryResult, SessionSnapshot), VnError> {
    loop {
        let at_menu = session
            .scry_next()
            .is_some_and(|scry| scry.menu_with_caption.is_some());
        let before_menu = at_menu.then(|| session.checkpoint());

        match session.step() {
            Ok(true) => {}
            Ok(false) => {
                let Transcript { lines, .. } = transcript.take();
                let boundary = BoundaryResult {
                    event: BoundaryEvent::End,
                    lines,
                    choices: Vec::new(),
                };
                return Ok((boundary, session.checkpoint()));
            }
            Err(error) if error.code == CHOICE_PENDING => {
                let Some(snapshot) = before_menu else {
                    return Err(error);
                };
                let Transcript { lines, choices } = transcript.take();
                let boundary = BoundaryResult {
                    event: BoundaryEvent::Choices,
                    lines,
                    choices,
                };
                return Ok((boundary, snapshot));
            }
            Err(error) => return Err(error),
        }
    }
}

pub(crate) fn emit_boundary(boundary: &BoundaryResult, counters: TranslationCounters) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::End => println!("EVENT:END"),
    }
    for line in &boundary.lines {
        println!(
            "LINE_JSON:{}",
            serde_json::json!({ "who": line.who, "what": line.what })
        );
    }
    for (index, caption) in &boundary.choices {
        println!("CHOICE:{}|{}", index, json_string(caption));
    }
    println!("SEEN:{}|{}", counters.seen, counters.new);
}
