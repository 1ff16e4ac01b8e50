//! Minimal DICT protocol client (RFC 2229)
//!
//! Blocking, one connection per client. [`DictClient::connect`] either
//! returns a connected client or fails; a dropped connection surfaces as
//! an error and is only re-established by an explicit
//! [`DictClient::reconnect`].

use crate::error::DictError;
use serde::Serialize;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 2628;
const IO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub term: String,
    pub database: String,
    pub description: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub database: String,
    pub word: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Strategy {
    pub name: String,
    pub description: String,
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

pub struct DictClient {
    host: String,
    port: u16,
    conn: Option<Connection>,
}

impl std::fmt::Debug for DictClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DictClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connected", &self.conn.is_some())
            .finish()
    }
}

impl DictClient {
    /// An unconnected client for `host` or `host:port`.
    pub fn new(address: &str) -> Self {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), port),
                Err(_) => (address.to_string(), DEFAULT_PORT),
            },
            None => (address.to_string(), DEFAULT_PORT),
        };
        Self {
            host,
            port,
            conn: None,
        }
    }

    pub fn connect(address: &str) -> Result<Self, DictError> {
        let mut client = Self::new(address);
        client.reconnect()?;
        Ok(client)
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Drops any current connection and opens a new one.
    pub fn reconnect(&mut self) -> Result<(), DictError> {
        self.conn = None;
        debug!(host = %self.host, port = self.port, "connecting to dict server");
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        let writer = stream.try_clone()?;
        self.conn = Some(Connection {
            reader: BufReader::new(stream),
            writer,
        });

        let (code, message) = self.status()?;
        if code != 220 {
            self.conn = None;
            return Err(DictError::Server { code, message });
        }
        self.command("CLIENT dircloud")?;
        self.expect(250)?;
        Ok(())
    }

    pub fn close(&mut self) {
        if self.conn.is_some() {
            let _ = self.command("QUIT");
        }
        self.conn = None;
    }

    /// Definitions of `word` in `database` (`*` for all). No match is an
    /// empty list.
    pub fn define(&mut self, database: &str, word: &str) -> Result<Vec<Definition>, DictError> {
        self.command(&format!("DEFINE {} {}", quote(database), quote(word)))?;
        let (code, message) = self.status()?;
        match code {
            552 => return Ok(Vec::new()),
            150 => {}
            _ => return Err(DictError::Server { code, message }),
        }

        let mut definitions = Vec::new();
        loop {
            let (code, message) = self.status()?;
            match code {
                151 => {
                    let fields = tokens(&message);
                    let [term, database, description] = match fields.as_slice() {
                        [term, database, description, ..] => [term, database, description],
                        [term, database] => [term, database, database],
                        _ => return Err(DictError::Protocol(message)),
                    };
                    let text = self.text_block()?.join("\n");
                    definitions.push(Definition {
                        term: term.clone(),
                        database: database.clone(),
                        description: description.clone(),
                        text,
                    });
                }
                250 => return Ok(definitions),
                _ => return Err(DictError::Server { code, message }),
            }
        }
    }

    /// Words matching `word` under `strategy`. No match is an empty list.
    pub fn match_words(&mut self, database: &str, strategy: &str, word: &str) -> Result<Vec<Match>, DictError> {
        self.command(&format!("MATCH {} {} {}", quote(database), quote(strategy), quote(word)))?;
        let (code, message) = self.status()?;
        match code {
            552 => return Ok(Vec::new()),
            152 => {}
            _ => return Err(DictError::Server { code, message }),
        }
        let matches = self
            .text_block()?
            .iter()
            .filter_map(|line| match tokens(line).as_slice() {
                [database, word, ..] => Some(Match {
                    database: database.clone(),
                    word: word.clone(),
                }),
                _ => None,
            })
            .collect();
        self.expect(250)?;
        Ok(matches)
    }

    pub fn strategies(&mut self) -> Result<Vec<Strategy>, DictError> {
        self.command("SHOW STRAT")?;
        let (code, message) = self.status()?;
        match code {
            555 => return Ok(Vec::new()),
            111 => {}
            _ => return Err(DictError::Server { code, message }),
        }
        let strategies = self
            .text_block()?
            .iter()
            .filter_map(|line| match tokens(line).as_slice() {
                [name, description, ..] => Some(Strategy {
                    name: name.clone(),
                    description: description.clone(),
                }),
                [name] => Some(Strategy {
                    name: name.clone(),
                    description: String::new(),
                }),
                _ => None,
            })
            .collect();
        self.expect(250)?;
        Ok(strategies)
    }

    /// Free-form server description (`SHOW SERVER`).
    pub fn server_info(&mut self) -> Result<Vec<String>, DictError> {
        self.command("SHOW SERVER")?;
        self.expect(114)?;
        let lines = self.text_block()?;
        self.expect(250)?;
        Ok(lines)
    }

    fn conn(&mut self) -> Result<&mut Connection, DictError> {
        self.conn.as_mut().ok_or(DictError::NotConnected)
    }

    fn command(&mut self, line: &str) -> Result<(), DictError> {
        let result = {
            let conn = self.conn()?;
            conn.writer
                .write_all(line.as_bytes())
                .and_then(|_| conn.writer.write_all(b"\r\n"))
                .and_then(|_| conn.writer.flush())
        };
        result.map_err(|e| self.drop_on_error(e))
    }

    fn read_line(&mut self) -> Result<String, DictError> {
        let mut buf = Vec::new();
        let read = {
            let conn = self.conn()?;
            conn.reader.read_until(b'\n', &mut buf)
        };
        match read {
            Ok(0) => {
                self.conn = None;
                Err(DictError::NotConnected)
            }
            Ok(_) => {
                while matches!(buf.last(), Some(b'\n' | b'\r')) {
                    buf.pop();
                }
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            Err(e) => Err(self.drop_on_error(e)),
        }
    }

    fn drop_on_error(&mut self, e: std::io::Error) -> DictError {
        self.conn = None;
        DictError::Io(e)
    }

    fn status(&mut self) -> Result<(u16, String), DictError> {
        let line = self.read_line()?;
        let code = line
            .get(..3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| DictError::Protocol(line.clone()))?;
        let message = line.get(3..).unwrap_or_default().trim().to_string();
        Ok((code, message))
    }

    fn expect(&mut self, expected: u16) -> Result<String, DictError> {
        let (code, message) = self.status()?;
        if code == expected {
            Ok(message)
        } else {
            Err(DictError::Server { code, message })
        }
    }

    /// Reads lines up to the lone `.` terminator, undoing dot-stuffing.
    fn text_block(&mut self) -> Result<Vec<String>, DictError> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line()?;
            if line == "." {
                return Ok(lines);
            }
            match line.strip_prefix("..") {
                Some(rest) => lines.push(format!(".{}", rest)),
                None => lines.push(line),
            }
        }
    }
}

impl Drop for DictClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Splits a response line into bare words and double-quoted strings.
fn tokens(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if c == '"' {
            chars.next();
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            token.push(escaped);
                        }
                    }
                    other => token.push(other),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        out.push(token);
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    /// Serves one connection: sends the banner, then for each scripted
    /// command checks its prefix and replies with the canned response.
    pub(crate) fn fake_server(script: Vec<(&'static str, &'static str)>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut writer = stream.try_clone().unwrap();
            let mut reader = BufReader::new(stream);
            writer.write_all(b"220 fake dictd <auth.mime> <1@fake>\r\n").unwrap();
            let mut script = script.into_iter();
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    return;
                }
                if line.starts_with("CLIENT") {
                    writer.write_all(b"250 ok\r\n").unwrap();
                    continue;
                }
                if line.starts_with("QUIT") {
                    let _ = writer.write_all(b"221 bye\r\n");
                    let mut rest = Vec::new();
                    let _ = reader.read_to_end(&mut rest);
                    return;
                }
                match script.next() {
                    Some((prefix, reply)) => {
                        assert!(line.starts_with(prefix), "unexpected command {:?}", line);
                        writer.write_all(reply.as_bytes()).unwrap();
                    }
                    None => return,
                }
            }
        });
        (address, handle)
    }

    #[test]
    fn test_define_parses_definitions() {
        let (address, server) = fake_server(vec![(
            "DEFINE \"*\" \"disk\"",
            "150 1 definitions retrieved\r\n\
             151 \"disk\" catalog \"Library catalog\"\r\n\
             disk\r\n\
             ..hidden\r\n\
             /srv/disk\r\n\
             .\r\n\
             250 ok\r\n",
        )]);
        let mut client = DictClient::connect(&address).unwrap();
        let defs = client.define("*", "disk").unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].term, "disk");
        assert_eq!(defs[0].database, "catalog");
        assert_eq!(defs[0].description, "Library catalog");
        assert_eq!(defs[0].text, "disk\n.hidden\n/srv/disk");
        drop(client);
        server.join().unwrap();
    }

    #[test]
    fn test_define_no_match_is_empty() {
        let (address, server) = fake_server(vec![("DEFINE", "552 no match\r\n")]);
        let mut client = DictClient::connect(&address).unwrap();
        assert!(client.define("*", "zzz").unwrap().is_empty());
        drop(client);
        server.join().unwrap();
    }

    #[test]
    fn test_match_and_strategies() {
        let (address, server) = fake_server(vec![
            (
                "SHOW STRAT",
                "111 2 strategies\r\nexact \"Match headwords exactly\"\r\nlev \"Levenshtein distance one\"\r\n.\r\n250 ok\r\n",
            ),
            (
                "MATCH \"*\" \"lev\" \"dsk\"",
                "152 2 matches\r\ncatalog \"disk\"\r\ncatalog \"desk\"\r\n.\r\n250 ok\r\n",
            ),
        ]);
        let mut client = DictClient::connect(&address).unwrap();
        let strategies = client.strategies().unwrap();
        assert_eq!(strategies[1].name, "lev");
        assert_eq!(strategies[1].description, "Levenshtein distance one");

        let matches = client.match_words("*", "lev", "dsk").unwrap();
        let words: Vec<&str> = matches.iter().map(|m| m.word.as_str()).collect();
        assert_eq!(words, vec!["disk", "desk"]);
        drop(client);
        server.join().unwrap();
    }

    #[test]
    fn test_server_error_is_reported() {
        let (address, server) = fake_server(vec![("DEFINE", "550 invalid database\r\n")]);
        let mut client = DictClient::connect(&address).unwrap();
        let err = client.define("nope", "x").unwrap_err();
        assert!(matches!(err, DictError::Server { code: 550, .. }));
        drop(client);
        server.join().unwrap();
    }

    #[test]
    fn test_unconnected_client() {
        let mut client = DictClient::new("localhost");
        assert!(!client.is_connected());
        assert!(matches!(client.define("*", "x"), Err(DictError::NotConnected)));
    }

    #[test]
    fn test_address_parsing() {
        let client = DictClient::new("dict.example.org:2700");
        assert_eq!(client.host, "dict.example.org");
        assert_eq!(client.port, 2700);
        let client = DictClient::new("localhost");
        assert_eq!(client.port, DEFAULT_PORT);
    }

    #[test]
    fn test_tokens_and_quote() {
        assert_eq!(
            tokens(r#""disk" catalog "A \"quoted\" db""#),
            vec!["disk", "catalog", "A \"quoted\" db"]
        );
        assert_eq!(quote(r#"a"b"#), r#""a\"b""#);
    }
}
