//! Client connection handling: discovery, connect, and the game session

use crate::discovery;
use crate::input::AnswerInput;
use crate::style::{paint, BLUE, CYAN, FAIL, HEADER, WARNING};
use log::{debug, info, warn};
use shared::{parse_server_chunk, ServerMessage};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How a game session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server announced a result
    GameOver(String),
    /// The server closed the connection without a result
    Disconnected,
}

pub struct Client {
    name: String,
    discovery_port: u16,
}

impl Client {
    pub fn new(name: String, discovery_port: u16) -> Self {
        Self {
            name,
            discovery_port,
        }
    }

    /// Looks for a server, plays one game, and starts over, forever
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let discovery_addr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), self.discovery_port);
        let mut input = AnswerInput::stdin();

        println!("{}", paint(CYAN, "Client started successfully!"));

        loop {
            println!("Listening for offer requests...");
            let server = discovery::discover(discovery_addr).await?;
            println!(
                "{}",
                paint(CYAN, &format!("Received offer from {}, attempting to connect...", server))
            );

            let stream = match connect(server).await {
                Ok(stream) => stream,
                Err(e) => {
                    println!("{}", paint(WARNING, &format!("Failed to connect: {}", e)));
                    continue;
                }
            };
            println!("{}", paint(CYAN, &format!("Successfully connected to server {}", server)));

            match play(stream, &self.name, &mut input).await {
                Ok(SessionEnd::GameOver(_)) => info!("Game finished"),
                Ok(SessionEnd::Disconnected) => {
                    println!("{}", paint(FAIL, "The server closed the connection."))
                }
                Err(e) => println!("{}", paint(FAIL, &format!("Connection lost: {}", e))),
            }

            sleep(RECONNECT_DELAY).await;
        }
    }
}

pub async fn connect(server: SocketAddr) -> io::Result<TcpStream> {
    match timeout(CONNECT_TIMEOUT, TcpStream::connect(server)).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            "timed out connecting to server",
        )),
    }
}

/// Plays one game over an established connection.
///
/// Sends the player's name, prints everything the server says, and forwards
/// typed answers while a question is open. Lines typed while no question is
/// open are dropped so they cannot answer the next one. Returns once a
/// result arrives or the server goes away.
pub async fn play<R>(
    stream: TcpStream,
    name: &str,
    input: &mut AnswerInput<R>,
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
{
    let (mut reader, mut writer) = stream.into_split();
    writer.write_all(format!("{}\n", name).as_bytes()).await?;

    let mut buf = [0u8; 1024];
    let mut question_open = false;
    let mut input_open = true;

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = read?;
                if n == 0 {
                    return Ok(SessionEnd::Disconnected);
                }

                let chunk = String::from_utf8_lossy(&buf[..n]);
                for message in parse_server_chunk(&chunk) {
                    match message {
                        ServerMessage::Expired => {
                            println!("{}", paint(BLUE, "Expired"));
                            question_open = false;
                        }
                        ServerMessage::Question(text) => {
                            println!("{}", paint(HEADER, &format!("True or false: {}?", text)));
                            question_open = true;
                        }
                        ServerMessage::Text(text) if question_open => {
                            println!("{}", paint(BLUE, &text));
                            return Ok(SessionEnd::GameOver(text));
                        }
                        ServerMessage::Text(text) => println!("{}", paint(HEADER, &text)),
                    }
                }
            }

            answer = input.next_answer(), if input_open => {
                match answer? {
                    Some(token) if question_open => {
                        debug!("Sending answer {}", token);
                        println!("client {} answer is: {}", name, token);
                        writer.write_all(token.as_bytes()).await?;
                    }
                    Some(token) => {
                        debug!("Dropping answer {} typed between questions", token);
                        println!("{}", paint(WARNING, "No question is open, answer ignored"));
                    }
                    None => {
                        warn!("Input closed, no more answers can be sent");
                        input_open = false;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{format_prompt, EXPIRED_SENTINEL};
    use tokio::io::{BufReader, DuplexStream};
    use tokio::net::TcpListener;

    /// Keyboard stand-in that types `line` once after `delay`
    fn typed_later(line: &'static str, delay: Duration) -> AnswerInput<BufReader<DuplexStream>> {
        let (mut keyboard, reader) = tokio::io::duplex(64);
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = keyboard.write_all(line.as_bytes()).await;
            // Keep the input open until the session is over
            sleep(Duration::from_secs(5)).await;
        });
        AnswerInput::new(BufReader::new(reader))
    }

    async fn read_some(stream: &mut TcpStream) -> String {
        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf[..n]).to_string()
    }

    #[tokio::test]
    async fn test_play_answers_and_reports_result() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            assert_eq!(read_some(&mut stream).await, "Alex\n");

            stream.write_all(b"Welcome!\nPlayer 1: Alex\n==\n").await.unwrap();
            stream
                .write_all(format_prompt("Cats can bark").as_bytes())
                .await
                .unwrap();

            let answer = read_some(&mut stream).await;
            stream
                .write_all(b"Game over!\nCongratulations to the winner: Alex\n")
                .await
                .unwrap();
            answer
        });

        let stream = connect(addr).await.unwrap();
        let mut input = typed_later("n\n", Duration::from_millis(300));
        let end = timeout(Duration::from_secs(2), play(stream, "Alex", &mut input))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(server.await.unwrap(), "n");
        match end {
            SessionEnd::GameOver(text) => assert!(text.contains("winner: Alex")),
            other => panic!("Unexpected session end: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_play_continues_after_sentinel() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_some(&mut stream).await;

            stream.write_all(b"Welcome!\n==\n").await.unwrap();
            stream
                .write_all(format_prompt("Cats can bark").as_bytes())
                .await
                .unwrap();
            sleep(Duration::from_millis(50)).await;
            stream.write_all(EXPIRED_SENTINEL.as_bytes()).await.unwrap();
            sleep(Duration::from_millis(50)).await;
            stream
                .write_all(format_prompt("Ducks have three eyelids").as_bytes())
                .await
                .unwrap();
            sleep(Duration::from_millis(50)).await;
            stream.write_all(b"Game over!\n").await.unwrap();
        });

        let stream = connect(addr).await.unwrap();
        // No keyboard input at all
        let mut input = AnswerInput::new(&b""[..]);
        let end = timeout(Duration::from_secs(2), play(stream, "Alex", &mut input))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(end, SessionEnd::GameOver("Game over!".to_string()));
    }

    #[tokio::test]
    async fn test_play_reports_disconnect() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_some(&mut stream).await;
        });

        let stream = connect(addr).await.unwrap();
        let mut input = AnswerInput::new(&b""[..]);
        let end = timeout(Duration::from_secs(2), play(stream, "Alex", &mut input))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(end, SessionEnd::Disconnected);
    }

    #[tokio::test]
    async fn test_play_drops_answers_typed_before_question() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            read_some(&mut stream).await;

            sleep(Duration::from_millis(200)).await;
            stream
                .write_all(format_prompt("Cats can bark").as_bytes())
                .await
                .unwrap();

            let leaked = timeout(Duration::from_millis(300), read_some(&mut stream)).await;
            stream.write_all(b"Game over!\n").await.unwrap();
            leaked.is_err()
        });

        let stream = connect(addr).await.unwrap();
        // Already typed when the session starts
        let mut input = AnswerInput::new(&b"y\n"[..]);
        let end = timeout(Duration::from_secs(2), play(stream, "Alex", &mut input))
            .await
            .unwrap()
            .unwrap();

        assert!(server.await.unwrap(), "early answer reached the server");
        assert_eq!(end, SessionEnd::GameOver("Game over!".to_string()));
    }
}
