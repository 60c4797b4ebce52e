//! Command dispatch: arity checks, the pre-command expiry pass, the
//! keyspace call, and the post-access stamping pass.
//!
//! Every data command flows through [`dispatch`]; snapshot replay uses
//! the same path, so a restored engine is built by exactly the code
//! that served the original commands. EXIT, SAVE, and RESTORE are the
//! gate's concern and never reach the keyspace.

use bytes::Bytes;
use thiserror::Error;

use ledis_core::{Keyspace, WrongType};
use ledis_protocol::{Command, Opcode, Reply};

/// Errors aborting a single command. The keyspace is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong number of arguments for the opcode.
    #[error("wrong number of arguments for '{0}'")]
    Arity(&'static str),

    /// An argument that must be an integer wasn't one.
    #[error("'{0}' is not an integer")]
    NotAnInteger(String),

    /// EXPIRE with negative seconds.
    #[error("seconds must not be negative")]
    NegativeSeconds,

    /// The key holds a value of the wrong shape.
    #[error(transparent)]
    WrongType(#[from] WrongType),

    /// Opcode that only the gate can run (EXIT/SAVE/RESTORE).
    #[error("'{0}' cannot be dispatched to the keyspace")]
    Unroutable(&'static str),
}

/// Executes one parsed command against the keyspace and wraps the
/// outcome into a [`Reply`].
pub fn dispatch(db: &Keyspace, cmd: &Command) -> Result<Reply, CommandError> {
    match cmd.opcode() {
        Opcode::Set => {
            let args = exact(cmd, 2)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            db.set(key, Bytes::from(args[1].clone()));
            Ok(Reply::Ok)
        }
        Opcode::Get => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let value = db.get(key)?;
            db.touch(&[key]);
            Ok(Reply::Str(value.map(text)))
        }
        Opcode::Del => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            Ok(Reply::Bool(db.del(key)))
        }
        Opcode::Keys => {
            exact(cmd, 0)?;
            db.sweep_expired_all();
            let keys = db.keys();
            db.touch_all();
            Ok(Reply::List(keys))
        }
        Opcode::FlushDb => {
            exact(cmd, 0)?;
            db.sweep_expired_all();
            db.flush();
            Ok(Reply::Ok)
        }
        Opcode::Expire => {
            let args = exact(cmd, 2)?;
            let key = args[0].as_str();
            let seconds = int_arg(&args[1])?;
            if seconds < 0 {
                return Err(CommandError::NegativeSeconds);
            }
            db.sweep_expired(&[key]);
            match db.expire(key, seconds as u64) {
                Some(remaining) => Ok(Reply::Int(remaining)),
                None => Ok(Reply::Int(-2)),
            }
        }
        Opcode::Ttl => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            Ok(Reply::Int(db.ttl(key).as_secs()))
        }
        Opcode::LPush | Opcode::RPush => {
            let args = at_least(cmd, 2)?;
            let key = args[0].as_str();
            let values: Vec<Bytes> = args[1..].iter().cloned().map(Bytes::from).collect();
            db.sweep_expired(&[key]);
            let len = if cmd.opcode() == Opcode::LPush {
                db.lpush(key, &values)?
            } else {
                db.rpush(key, &values)?
            };
            db.touch(&[key]);
            Ok(Reply::Int(len as i64))
        }
        Opcode::LPop | Opcode::RPop => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let popped = if cmd.opcode() == Opcode::LPop {
                db.lpop(key)?
            } else {
                db.rpop(key)?
            };
            db.touch(&[key]);
            Ok(Reply::Str(popped.map(text)))
        }
        Opcode::LLen => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let len = db.llen(key)?;
            db.touch(&[key]);
            Ok(Reply::Int(len as i64))
        }
        Opcode::LRange => {
            let args = exact(cmd, 3)?;
            let key = args[0].as_str();
            let start = int_arg(&args[1])?;
            let stop = int_arg(&args[2])?;
            db.sweep_expired(&[key]);
            let items = db.lrange(key, start, stop)?;
            db.touch(&[key]);
            Ok(Reply::List(items.into_iter().map(text).collect()))
        }
        Opcode::SAdd => {
            let args = at_least(cmd, 2)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let added = db.sadd(key, &args[1..])?;
            db.touch(&[key]);
            Ok(Reply::Int(added as i64))
        }
        Opcode::SRem => {
            let args = at_least(cmd, 2)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let removed = db.srem(key, &args[1..])?;
            db.touch(&[key]);
            Ok(Reply::Int(removed as i64))
        }
        Opcode::SCard => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let card = db.scard(key)?;
            db.touch(&[key]);
            Ok(Reply::Int(card as i64))
        }
        Opcode::SMembers => {
            let args = exact(cmd, 1)?;
            let key = args[0].as_str();
            db.sweep_expired(&[key]);
            let members = db.smembers(key)?;
            db.touch(&[key]);
            Ok(Reply::List(members))
        }
        Opcode::SInter => {
            let args = at_least(cmd, 2)?;
            let names: Vec<&str> = args.iter().map(String::as_str).collect();
            db.sweep_expired(&names);
            let members = db.sinter(&names)?;
            db.touch(&names);
            Ok(Reply::List(members))
        }
        Opcode::Save | Opcode::Restore | Opcode::Exit => {
            Err(CommandError::Unroutable(cmd.opcode().name()))
        }
    }
}

fn exact<'a>(cmd: &'a Command, n: usize) -> Result<&'a [String], CommandError> {
    if cmd.args().len() == n {
        Ok(cmd.args())
    } else {
        Err(CommandError::Arity(cmd.opcode().name()))
    }
}

fn at_least<'a>(cmd: &'a Command, n: usize) -> Result<&'a [String], CommandError> {
    if cmd.args().len() >= n {
        Ok(cmd.args())
    } else {
        Err(CommandError::Arity(cmd.opcode().name()))
    }
}

fn int_arg(token: &str) -> Result<i64, CommandError> {
    token
        .parse()
        .map_err(|_| CommandError::NotAnInteger(token.to_owned()))
}

/// Stored values arrive as whitespace-free tokens, so this conversion
/// is lossless in practice.
fn text(data: Bytes) -> String {
    String::from_utf8_lossy(&data).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(db: &Keyspace, line: &str) -> Result<Reply, CommandError> {
        dispatch(db, &Command::parse(line).unwrap())
    }

    #[test]
    fn set_get_del_cycle() {
        let db = Keyspace::new();
        assert_eq!(run(&db, "set foo bar").unwrap(), Reply::Ok);
        assert_eq!(run(&db, "get foo").unwrap(), Reply::Str(Some("bar".into())));
        assert_eq!(run(&db, "del foo").unwrap(), Reply::Bool(true));
        assert_eq!(run(&db, "get foo").unwrap(), Reply::Str(None));
        assert_eq!(run(&db, "del foo").unwrap(), Reply::Bool(false));
    }

    #[test]
    fn arity_is_enforced() {
        let db = Keyspace::new();
        assert_eq!(
            run(&db, "set foo").unwrap_err(),
            CommandError::Arity("set")
        );
        assert_eq!(
            run(&db, "get a b").unwrap_err(),
            CommandError::Arity("get")
        );
        assert_eq!(run(&db, "keys extra").unwrap_err(), CommandError::Arity("keys"));
        assert_eq!(run(&db, "lpush l").unwrap_err(), CommandError::Arity("lpush"));
        assert_eq!(
            run(&db, "lrange l 0").unwrap_err(),
            CommandError::Arity("lrange")
        );
        assert_eq!(run(&db, "sinter s").unwrap_err(), CommandError::Arity("sinter"));
        assert_eq!(run(&db, "expire k").unwrap_err(), CommandError::Arity("expire"));
    }

    #[test]
    fn integer_arguments_are_validated() {
        let db = Keyspace::new();
        run(&db, "rpush l a b").unwrap();
        assert_eq!(
            run(&db, "lrange l zero -1").unwrap_err(),
            CommandError::NotAnInteger("zero".into())
        );
        run(&db, "set k v").unwrap();
        assert_eq!(
            run(&db, "expire k soon").unwrap_err(),
            CommandError::NotAnInteger("soon".into())
        );
    }

    #[test]
    fn negative_expire_is_rejected() {
        let db = Keyspace::new();
        run(&db, "set k v").unwrap();
        assert_eq!(
            run(&db, "expire k -5").unwrap_err(),
            CommandError::NegativeSeconds
        );
        // the key is untouched
        assert_eq!(run(&db, "ttl k").unwrap(), Reply::Int(-1));
    }

    #[test]
    fn expire_on_missing_key() {
        let db = Keyspace::new();
        assert_eq!(run(&db, "expire ghost 10").unwrap(), Reply::Int(-2));
    }

    #[test]
    fn type_mismatch_leaves_value_unchanged() {
        let db = Keyspace::new();
        run(&db, "set x 1").unwrap();
        assert_eq!(
            run(&db, "lpush x a").unwrap_err(),
            CommandError::WrongType(WrongType)
        );
        assert_eq!(run(&db, "get x").unwrap(), Reply::Str(Some("1".into())));
    }

    #[test]
    fn push_pop_through_dispatch() {
        let db = Keyspace::new();
        assert_eq!(run(&db, "rpush L a b c").unwrap(), Reply::Int(3));
        assert_eq!(
            run(&db, "lrange L 0 -1").unwrap(),
            Reply::List(vec!["a".into(), "b".into(), "c".into()])
        );
        assert_eq!(run(&db, "lpop L").unwrap(), Reply::Str(Some("a".into())));
        assert_eq!(run(&db, "llen L").unwrap(), Reply::Int(2));
    }

    #[test]
    fn set_family_through_dispatch() {
        let db = Keyspace::new();
        assert_eq!(run(&db, "sadd S a b c").unwrap(), Reply::Int(3));
        assert_eq!(run(&db, "sadd S a d").unwrap(), Reply::Int(1));
        assert_eq!(run(&db, "scard S").unwrap(), Reply::Int(4));
        assert_eq!(
            run(&db, "smembers S").unwrap(),
            Reply::List(vec!["a".into(), "b".into(), "c".into(), "d".into()])
        );
    }

    #[test]
    fn keys_lists_live_keys() {
        let db = Keyspace::new();
        run(&db, "set b 2").unwrap();
        run(&db, "set a 1").unwrap();
        assert_eq!(
            run(&db, "keys").unwrap(),
            Reply::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn reads_stamp_last_access() {
        let db = Keyspace::new();
        run(&db, "set k v").unwrap();
        let stamped = db.last_access("k").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        run(&db, "get k").unwrap();
        assert!(db.last_access("k").unwrap() > stamped);
    }

    #[test]
    fn gate_only_opcodes_are_unroutable() {
        let db = Keyspace::new();
        assert_eq!(run(&db, "save").unwrap_err(), CommandError::Unroutable("save"));
        assert_eq!(
            run(&db, "restore").unwrap_err(),
            CommandError::Unroutable("restore")
        );
        assert_eq!(run(&db, "exit").unwrap_err(), CommandError::Unroutable("exit"));
    }
}
