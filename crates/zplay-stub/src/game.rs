//! Game session and the dispatch table.
//!
//! Each command is matched against [`RULES`] in order. A rule is keyed by the
//! verb, the object it names, where the player must stand, and what the player
//! must carry. The first rule that fits produces the reply and may change the
//! world. Commands no rule accepts fall through to a generic refusal.

use crate::error::{StubError, StubResult};
use crate::parser::{Command, Direction, Verb, parse_command};
use crate::world::{Item, Location, World};

const BANNER: &str = "ZPLAY SCRIPTED ADVENTURE\nA small corner of the great underground empire.\nRelease 1\n";

const BROCHURE_TEXT: &str = "\"WELCOME TO THE GREAT UNDERGROUND EMPIRE!\n\nThis is a game of adventure, danger, and low cunning. In it you will explore some of the most amazing territory ever seen by mortals. No computer should be without one!\"";

/// Something a command can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Object {
    Mailbox,
    House,
    Carried(Item),
}

impl Object {
    fn parse(noun: &str) -> Option<Self> {
        match noun {
            "mailbox" | "box" => Some(Self::Mailbox),
            "house" => Some(Self::House),
            other => Item::parse(other).map(Self::Carried),
        }
    }
}

type Action = fn(&mut World) -> StubResult<String>;

struct Rule {
    verb: Verb,
    object: Option<Object>,
    at: Option<Location>,
    holding: Option<Item>,
    action: Action,
}

impl Rule {
    fn matches(&self, verb: Verb, object: Option<Object>, world: &World) -> bool {
        self.verb == verb
            && self.object == object
            && self.at.is_none_or(|at| at == world.location)
            && self.holding.is_none_or(|item| world.holds(item))
    }
}

const BROCHURE: Option<Object> = Some(Object::Carried(Item::Brochure));

const RULES: &[Rule] = &[
    Rule {
        verb: Verb::Look,
        object: None,
        at: None,
        holding: None,
        action: |world| Ok(describe(world)),
    },
    Rule {
        verb: Verb::Inventory,
        object: None,
        at: None,
        holding: None,
        action: inventory,
    },
    Rule {
        verb: Verb::Open,
        object: Some(Object::Mailbox),
        at: Some(Location::WestOfHouse),
        holding: None,
        action: open_mailbox,
    },
    Rule {
        verb: Verb::Close,
        object: Some(Object::Mailbox),
        at: Some(Location::WestOfHouse),
        holding: None,
        action: close_mailbox,
    },
    Rule {
        verb: Verb::Examine,
        object: Some(Object::Mailbox),
        at: Some(Location::WestOfHouse),
        holding: None,
        action: examine_mailbox,
    },
    Rule {
        verb: Verb::Take,
        object: Some(Object::Mailbox),
        at: Some(Location::WestOfHouse),
        holding: None,
        action: |_| Ok("It is securely anchored.".to_string()),
    },
    Rule {
        verb: Verb::Examine,
        object: Some(Object::House),
        at: None,
        holding: None,
        action: |_| Ok("The house is a beautiful colonial house which is painted white. It is clear that the owners must have been extremely wealthy.".to_string()),
    },
    Rule {
        verb: Verb::Open,
        object: Some(Object::House),
        at: Some(Location::WestOfHouse),
        holding: None,
        action: |_| Ok("The door is boarded and you can't remove the boards.".to_string()),
    },
    Rule {
        verb: Verb::Take,
        object: BROCHURE,
        at: None,
        holding: Some(Item::Brochure),
        action: |_| Ok("You already have that!".to_string()),
    },
    Rule {
        verb: Verb::Take,
        object: BROCHURE,
        at: None,
        holding: None,
        action: |world| take(world, Item::Brochure),
    },
    Rule {
        verb: Verb::Drop,
        object: BROCHURE,
        at: None,
        holding: Some(Item::Brochure),
        action: |world| {
            world.put_down(Item::Brochure);
            Ok("Dropped.".to_string())
        },
    },
    Rule {
        verb: Verb::Read,
        object: BROCHURE,
        at: None,
        holding: Some(Item::Brochure),
        action: |_| Ok(BROCHURE_TEXT.to_string()),
    },
    Rule {
        verb: Verb::Examine,
        object: BROCHURE,
        at: None,
        holding: Some(Item::Brochure),
        action: |_| Ok(BROCHURE_TEXT.to_string()),
    },
];

fn describe(world: &World) -> String {
    let here = world.location;
    let mut output = format!("{}\n{}", here.name(), here.description());

    if here == Location::WestOfHouse {
        output.push_str("\nThere is a small mailbox here.");
        let contents: Vec<Item> = world.mailbox_contents().collect();
        if world.mailbox_opened && !contents.is_empty() {
            output.push_str("\nThe small mailbox contains:");
            for item in contents {
                output.push_str(&format!("\n  {}", capitalize(item.indefinite())));
            }
        }
    }

    for item in world.items_here() {
        output.push_str(&format!("\nThere is {} here.", item.indefinite()));
    }
    output
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn inventory(world: &mut World) -> StubResult<String> {
    if world.inventory.is_empty() {
        return Ok("You are empty-handed.".to_string());
    }
    let mut output = "You are carrying:".to_string();
    for item in &world.inventory {
        output.push_str(&format!("\n  {}", capitalize(item.indefinite())));
    }
    Ok(output)
}

fn open_mailbox(world: &mut World) -> StubResult<String> {
    if world.mailbox_opened {
        return Ok("It is already open.".to_string());
    }
    world.mailbox_opened = true;
    let contents: Vec<&str> = world.mailbox_contents().map(|item| item.indefinite()).collect();
    if contents.is_empty() {
        Ok("Opened.".to_string())
    } else {
        Ok(format!(
            "Opening the small mailbox, you see {}.",
            contents.join(" and ")
        ))
    }
}

fn close_mailbox(world: &mut World) -> StubResult<String> {
    if !world.mailbox_opened {
        return Ok("It is already closed.".to_string());
    }
    world.mailbox_opened = false;
    Ok("Closed.".to_string())
}

fn examine_mailbox(world: &mut World) -> StubResult<String> {
    let state = if world.mailbox_opened { "open" } else { "closed" };
    Ok(format!("The small mailbox is {state}."))
}

fn take(world: &mut World, item: Item) -> StubResult<String> {
    if !world.reachable(item) {
        return Err(StubError::NotHere(noun_of(item).to_string()));
    }
    world.pick_up(item);
    Ok("Taken.".to_string())
}

fn noun_of(item: Item) -> &'static str {
    match item {
        Item::Brochure => "brochure",
    }
}

/// One playthrough of the scripted game.
#[derive(Debug, Clone, Default)]
pub struct StubGame {
    world: World,
    halted: bool,
    turns: u32,
}

impl StubGame {
    /// A fresh game standing west of the house.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current world state.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Whether the player has quit.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Commands processed so far.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// The banner and first room description.
    pub fn opening(&self) -> String {
        format!("{BANNER}\n{}", describe(&self.world))
    }

    /// Process one line of input and return the reply the player sees.
    pub fn process(&mut self, input: &str) -> String {
        match self.execute(parse_command(input)) {
            Ok(reply) => reply,
            Err(err) => err.to_string(),
        }
    }

    /// Execute a parsed command.
    pub fn execute(&mut self, command: Command) -> StubResult<String> {
        if self.halted {
            return Err(StubError::Halted);
        }
        self.turns += 1;
        match command {
            Command::Empty => Err(StubError::Empty),
            Command::Unknown(word) => Err(StubError::UnknownWord(word)),
            Command::Move(direction) => self.go(direction),
            Command::Act {
                verb: Verb::Quit, ..
            } => {
                self.halted = true;
                Ok(format!("Your game ended after {} moves.", self.turns))
            }
            Command::Act { verb, noun } => self.dispatch(verb, noun.as_deref()),
        }
    }

    fn go(&mut self, direction: Direction) -> StubResult<String> {
        if self.world.location == Location::WestOfHouse && direction == Direction::East {
            return Ok("The door is boarded and you can't remove the boards.".to_string());
        }
        let next = self.world.location.exit(direction).ok_or(StubError::NoExit)?;
        self.world.location = next;
        Ok(describe(&self.world))
    }

    fn dispatch(&mut self, verb: Verb, noun: Option<&str>) -> StubResult<String> {
        let object = match noun {
            Some(noun) => Some(Object::parse(noun).ok_or_else(|| StubError::NotHere(noun.to_string()))?),
            None => None,
        };

        if let Some(rule) = RULES
            .iter()
            .find(|rule| rule.matches(verb, object, &self.world))
        {
            return (rule.action)(&mut self.world);
        }

        match (object, noun) {
            (None, _) => Err(StubError::MissingObject(verb.name().to_string())),
            (Some(Object::Mailbox), Some(noun)) if self.world.location != Location::WestOfHouse => {
                Err(StubError::NotHere(noun.to_string()))
            }
            (Some(Object::Carried(item)), Some(noun))
                if !self.world.holds(item) && !self.world.reachable(item) =>
            {
                Err(StubError::NotHere(noun.to_string()))
            }
            (Some(Object::Carried(item)), Some(noun)) if !self.world.holds(item) => {
                Err(StubError::NotHeld(noun.to_string()))
            }
            (Some(_), Some(noun)) => Err(StubError::Pointless {
                verb: verb.name().to_string(),
                noun: noun.to_string(),
            }),
            (Some(_), None) => Err(StubError::MissingObject(verb.name().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_is_west_of_house() {
        let game = StubGame::new();
        let opening = game.opening();
        assert!(opening.contains("West of House"));
        assert!(opening.contains("small mailbox"));
    }

    #[test]
    fn mailbox_must_be_opened_first() {
        let mut game = StubGame::new();
        assert_eq!(
            game.process("take brochure"),
            "You can't see any brochure here!"
        );
        assert!(game.process("open mailbox").contains("you see a brochure"));
        assert_eq!(game.process("open mailbox"), "It is already open.");
        assert_eq!(game.process("take brochure"), "Taken.");
        assert_eq!(game.process("take brochure"), "You already have that!");
    }

    #[test]
    fn look_lists_mailbox_contents() {
        let mut game = StubGame::new();
        game.process("open mailbox");
        assert!(game.process("look").contains("A brochure"));
        game.process("take brochure");
        assert!(!game.process("look").contains("A brochure"));
    }

    #[test]
    fn movement_follows_exits() {
        let mut game = StubGame::new();
        assert!(game.process("north").starts_with("North of House"));
        assert!(game.process("go east").starts_with("Behind House"));
        assert_eq!(game.process("east"), "You can't go that way.");
        assert_eq!(game.world().location, Location::BehindHouse);
    }

    #[test]
    fn front_door_is_boarded() {
        let mut game = StubGame::new();
        assert!(game.process("east").contains("boarded"));
        assert_eq!(game.world().location, Location::WestOfHouse);
    }

    #[test]
    fn mailbox_is_only_west_of_house() {
        let mut game = StubGame::new();
        game.process("s");
        assert_eq!(game.process("open mailbox"), "You can't see any mailbox here!");
    }

    #[test]
    fn reading_needs_the_brochure_in_hand() {
        let mut game = StubGame::new();
        game.process("open mailbox");
        assert_eq!(game.process("read brochure"), "You don't have the brochure.");
        game.process("get leaflet");
        assert!(game.process("read brochure").contains("WELCOME"));
    }

    #[test]
    fn drop_leaves_item_in_room() {
        let mut game = StubGame::new();
        game.process("open mailbox");
        game.process("take brochure");
        game.process("north");
        assert_eq!(game.process("drop brochure"), "Dropped.");
        assert!(game.process("look").contains("There is a brochure here."));
        assert_eq!(game.process("inventory"), "You are empty-handed.");
    }

    #[test]
    fn refusals_render_as_text() {
        let mut game = StubGame::new();
        assert_eq!(game.process(""), "I beg your pardon?");
        assert_eq!(game.process("xyzzy"), "I don't know the word \"xyzzy\".");
        assert_eq!(game.process("open"), "What do you want to open?");
        assert_eq!(game.process("take lamp"), "You can't see any lamp here!");
        assert_eq!(game.process("read mailbox"), "You can't read the mailbox.");
    }

    #[test]
    fn quit_halts_the_game() {
        let mut game = StubGame::new();
        game.process("look");
        assert!(game.process("quit").contains("2 moves"));
        assert!(game.is_halted());
        assert_eq!(game.execute(parse_command("look")), Err(StubError::Halted));
    }
}
