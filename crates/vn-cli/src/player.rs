use std::io::{self, BufRead, Write};

use vn_api::{create_session_from_json, CreateSessionFromJsonOptions};
use vn_core::{VnError, VnValue};
use vn_runtime::{Interface, MenuRequest, SayRequest, ShowRequest};

use crate::{
    display_name, load_session_config, load_source_by_scripts_dir, map_cli_io, PlayArgs,
};

/// Plays a script on a terminal: dialogue is printed and menus are
/// answered by typing the number shown next to a choice.
pub(crate) struct LinePlayer {
    reader: Box<dyn BufRead>,
    writer: Box<dyn Write>,
}

impl LinePlayer {
    pub(crate) fn new(reader: Box<dyn BufRead>, writer: Box<dyn Write>) -> Self {
        Self { reader, writer }
    }

    fn print(&mut self, text: &str) -> Result<(), VnError> {
        writeln!(self.writer, "{}", text).map_err(map_cli_io)
    }

    fn read_choice(&mut self, selectable: &[usize]) -> Result<usize, VnError> {
        loop {
            write!(self.writer, "> ").map_err(map_cli_io)?;
            self.writer.flush().map_err(map_cli_io)?;

            let mut raw = String::new();
            if self.reader.read_line(&mut raw).map_err(map_cli_io)? == 0 {
                return Err(VnError::usage(
                    "CLI_INPUT_EOF",
                    "Input ended while a menu was waiting for a choice.",
                ));
            }
            let raw = raw.trim();
            match raw.parse::<usize>() {
                Ok(choice) if selectable.contains(&choice) => return Ok(choice),
                _ => self.print(&format!("Invalid choice index: {}", raw))?,
            }
        }
    }
}

impl Interface for LinePlayer {
    fn say(&mut self, request: &SayRequest) -> Result<(), VnError> {
        self.print("")?;
        match request.who.as_ref().and_then(display_name) {
            Some(who) => self.print(&format!("{}: {}", who, request.what)),
            None => self.print(&request.what),
        }
    }

    fn choose(&mut self, request: &MenuRequest) -> Result<Option<usize>, VnError> {
        self.print("")?;
        let mut selectable = Vec::new();
        for (index, item) in request.items.iter().enumerate() {
            if item.item.is_some() {
                selectable.push(index);
                self.print(&format!("  [{}] {}", index, item.caption))?;
            } else {
                self.print(&format!("  {}", item.caption))?;
            }
        }
        if selectable.is_empty() {
            return Ok(None);
        }
        self.read_choice(&selectable).map(Some)
    }

    fn show(&mut self, request: &ShowRequest) -> Result<(), VnError> {
        self.print(&format!("[show {} on {}]", request.name.join(" "), request.layer))
    }

    fn hide(&mut self, tag: &str, layer: &str) -> Result<(), VnError> {
        self.print(&format!("[hide {} on {}]", tag, layer))
    }

    fn scene(&mut self, layer: &str) -> Result<(), VnError> {
        self.print(&format!("[scene on {}]", layer))
    }

    fn with_statement(
        &mut self,
        transition: &VnValue,
        _paired: Option<&VnValue>,
    ) -> Result<(), VnError> {
        match display_name(transition) {
            Some(name) if transition.truthy() => self.print(&format!("[with {}]", name)),
            _ => Ok(()),
        }
    }
}

pub(crate) fn run_play(args: PlayArgs) -> Result<i32, VnError> {
    let scenario = load_source_by_scripts_dir(&args.scripts_dir)?;
    let config = load_session_config(&args.session)?;
    let player = LinePlayer::new(Box::new(io::stdin().lock()), Box::new(io::stdout()));

    let mut session = create_session_from_json(CreateSessionFromJsonOptions {
        scripts_json: scenario.scripts_json,
        entry_label: args.entry_label,
        config,
        interface: Box::new(player),
        registry: None,
        persistent: None,
    })?;
    session.run()?;

    let counters = session.counters();
    tracing::info!(seen = counters.seen, new = counters.new, "playthrough finished");
    println!();
    println!("-- end --");
    Ok(0)
}

#[cfg(test)]
mod player_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use vn_runtime::ChoiceItem;

    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn player(input: &str) -> (LinePlayer, SharedBuffer) {
        let output = SharedBuffer::default();
        let player = LinePlayer::new(
            Box::new(Cursor::new(input.as_bytes().to_vec())),
            Box::new(output.clone()),
        );
        (player, output)
    }

    fn menu() -> MenuRequest {
        let item = |caption: &str, item: Option<usize>| ChoiceItem {
            caption: caption.to_string(),
            item,
            args: Vec::new(),
            kwargs: Default::default(),
        };
        MenuRequest {
            items: vec![item("Where?", None), item("Park", Some(1)), item("Beach", Some(2))],
            args: Vec::new(),
            kwargs: Default::default(),
        }
    }

    #[test]
    fn choose_reprompts_until_a_selectable_index_is_typed() {
        let (mut player, output) = player("0\nbeach\n2\n");
        let choice = player.choose(&menu()).expect("choice");
        assert_eq!(choice, Some(2));
        let text = String::from_utf8(output.0.borrow().clone()).expect("utf8");
        assert!(text.contains("  Where?\n"));
        assert!(text.contains("  [1] Park\n"));
        assert!(text.contains("Invalid choice index: 0"));
        assert!(text.contains("Invalid choice index: beach"));
    }

    #[test]
    fn choose_fails_when_input_ends() {
        let (mut player, _) = player("");
        let error = player.choose(&menu()).expect_err("eof should fail");
        assert_eq!(error.code, "CLI_INPUT_EOF");
    }

    #[test]
    fn say_prefixes_the_speaker() {
        let (mut player, output) = player("");
        player
            .say(&SayRequest {
                who: Some(VnValue::String("Eileen".to_string())),
                what: "Hello.".to_string(),
                interact: true,
                args: Vec::new(),
                kwargs: Default::default(),
                attributes: None,
                temporary_attributes: None,
            })
            .expect("say");
        let text = String::from_utf8(output.0.borrow().clone()).expect("utf8");
        assert_eq!(text, "\nEileen: Hello.\n");
    }
}
