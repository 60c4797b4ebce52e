//! Opcode table and command-line tokenization.
//!
//! A raw line splits into an opcode token and an argument line; the
//! argument line splits on whitespace into positional arguments.
//! Argument arity is the dispatcher's concern, not the parser's.

use crate::error::ProtocolError;

/// Every command the engine understands.
///
/// The wire numbers are the snapshot file's record tags and must never
/// be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Set,
    Get,
    LLen,
    LPush,
    RPush,
    LPop,
    RPop,
    LRange,
    SAdd,
    SRem,
    SMembers,
    SInter,
    SCard,
    Del,
    Expire,
    Ttl,
    Keys,
    FlushDb,
    Exit,
    Save,
    Restore,
}

impl Opcode {
    /// Looks up an opcode by its textual name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Opcode> {
        let lowered = name.to_ascii_lowercase();
        let op = match lowered.as_str() {
            "set" => Opcode::Set,
            "get" => Opcode::Get,
            "llen" => Opcode::LLen,
            "lpush" => Opcode::LPush,
            "rpush" => Opcode::RPush,
            "lpop" => Opcode::LPop,
            "rpop" => Opcode::RPop,
            "lrange" => Opcode::LRange,
            "sadd" => Opcode::SAdd,
            "srem" => Opcode::SRem,
            "smembers" => Opcode::SMembers,
            "sinter" => Opcode::SInter,
            "scard" => Opcode::SCard,
            "del" => Opcode::Del,
            "expire" => Opcode::Expire,
            "ttl" => Opcode::Ttl,
            "keys" => Opcode::Keys,
            "flushdb" => Opcode::FlushDb,
            "exit" => Opcode::Exit,
            "save" => Opcode::Save,
            "restore" => Opcode::Restore,
            _ => return None,
        };
        Some(op)
    }

    /// The lowercase command name.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Set => "set",
            Opcode::Get => "get",
            Opcode::LLen => "llen",
            Opcode::LPush => "lpush",
            Opcode::RPush => "rpush",
            Opcode::LPop => "lpop",
            Opcode::RPop => "rpop",
            Opcode::LRange => "lrange",
            Opcode::SAdd => "sadd",
            Opcode::SRem => "srem",
            Opcode::SMembers => "smembers",
            Opcode::SInter => "sinter",
            Opcode::SCard => "scard",
            Opcode::Del => "del",
            Opcode::Expire => "expire",
            Opcode::Ttl => "ttl",
            Opcode::Keys => "keys",
            Opcode::FlushDb => "flushdb",
            Opcode::Exit => "exit",
            Opcode::Save => "save",
            Opcode::Restore => "restore",
        }
    }

    /// The stable wire number used as a snapshot record tag.
    pub fn to_wire(self) -> u16 {
        match self {
            Opcode::Set => 0,
            Opcode::Get => 1,
            Opcode::LLen => 2,
            Opcode::LPush => 3,
            Opcode::RPush => 4,
            Opcode::LPop => 5,
            Opcode::RPop => 6,
            Opcode::LRange => 7,
            Opcode::SAdd => 8,
            Opcode::SRem => 9,
            Opcode::SMembers => 10,
            Opcode::SInter => 11,
            Opcode::SCard => 12,
            Opcode::Del => 13,
            Opcode::Expire => 14,
            Opcode::Ttl => 15,
            Opcode::Keys => 16,
            Opcode::FlushDb => 17,
            Opcode::Exit => 18,
            Opcode::Save => 19,
            Opcode::Restore => 20,
        }
    }

    /// Resolves a wire number back to its opcode.
    pub fn from_wire(code: u16) -> Option<Opcode> {
        let op = match code {
            0 => Opcode::Set,
            1 => Opcode::Get,
            2 => Opcode::LLen,
            3 => Opcode::LPush,
            4 => Opcode::RPush,
            5 => Opcode::LPop,
            6 => Opcode::RPop,
            7 => Opcode::LRange,
            8 => Opcode::SAdd,
            9 => Opcode::SRem,
            10 => Opcode::SMembers,
            11 => Opcode::SInter,
            12 => Opcode::SCard,
            13 => Opcode::Del,
            14 => Opcode::Expire,
            15 => Opcode::Ttl,
            16 => Opcode::Keys,
            17 => Opcode::FlushDb,
            18 => Opcode::Exit,
            19 => Opcode::Save,
            20 => Opcode::Restore,
            _ => return None,
        };
        Some(op)
    }
}

/// A tokenized command line: the opcode and its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    opcode: Opcode,
    args: Vec<String>,
}

impl Command {
    /// Tokenizes a raw command line.
    pub fn parse(line: &str) -> Result<Command, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ProtocolError::EmptyLine)?;
        let opcode =
            Opcode::from_name(name).ok_or_else(|| ProtocolError::UnknownCommand(name.into()))?;
        Ok(Command {
            opcode,
            args: tokens.map(String::from).collect(),
        })
    }

    /// Builds a command from an already-known opcode and a raw
    /// argument line, as read back from a snapshot record.
    pub fn from_parts(opcode: Opcode, arg_line: &str) -> Command {
        Command {
            opcode,
            args: arg_line.split_whitespace().map(String::from).collect(),
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The argument line as logged and persisted: the arguments
    /// re-joined with single spaces (tokenization is lossy only in
    /// whitespace, which carries no meaning here).
    pub fn arg_line(&self) -> String {
        self.args.join(" ")
    }
}
