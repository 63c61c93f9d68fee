//! Tests of the Webdis store against a stub HTTP server.
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Write},
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex},
    thread,
};
use trajectory_core::{Memory, MemoryError, RecordBatch, Result, Transition, TransitionBatch};
use trajectory_remote::{ListStore, RemoteMemory, WebdisConfig, WebdisListStore};

type Batch = TransitionBatch<Vec<f32>, i64>;

fn transition(x: f32) -> Transition<Vec<f32>, i64> {
    Transition::new(vec![x, -x], x as i64, x, x > 2., vec![x + 1., -x - 1.])
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = vec![];
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            out.push(u8::from_str_radix(&s[i + 1..i + 3], 16).unwrap());
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).unwrap()
}

/// Serves every connection with `respond(command args) -> (status, body)`.
fn serve<F>(respond: F) -> String
where
    F: Fn(&[String]) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            handle(stream, &respond);
        }
    });
    format!("http://{}", addr)
}

fn handle<F: Fn(&[String]) -> (u16, String)>(mut stream: TcpStream, respond: &F) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap() == 0 || header == "\r\n" {
            break;
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let args = path
        .trim_start_matches('/')
        .split('/')
        .map(percent_decode)
        .collect::<Vec<_>>();
    let (status, body) = respond(&args);
    let resp = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(resp.as_bytes()).unwrap();
}

fn resolve(ix: &str, len: usize) -> i64 {
    let ix: i64 = ix.parse().unwrap();
    if ix < 0 {
        len as i64 + ix
    } else {
        ix
    }
}

/// A minimal Redis list server speaking the Webdis JSON format.
fn redis(lists: &Mutex<HashMap<String, Vec<String>>>, args: &[String]) -> (u16, String) {
    let mut lists = lists.lock().unwrap();
    let reply: Value = match args[0].as_str() {
        "RPUSH" => {
            let list = lists.entry(args[1].clone()).or_default();
            list.extend_from_slice(&args[2..]);
            json!({ "RPUSH": list.len() })
        }
        "LLEN" => json!({ "LLEN": lists.get(&args[1]).map_or(0, Vec::len) }),
        "LRANGE" => {
            let list = lists.get(&args[1]).cloned().unwrap_or_default();
            let start = resolve(&args[2], list.len()).max(0);
            let stop = resolve(&args[3], list.len()).min(list.len() as i64 - 1);
            let values = if start > stop {
                vec![]
            } else {
                list[start as usize..=stop as usize].to_vec()
            };
            json!({ "LRANGE": values })
        }
        "LINDEX" => {
            let list = lists.get(&args[1]).cloned().unwrap_or_default();
            let ix = resolve(&args[2], list.len());
            let value = if ix < 0 {
                None
            } else {
                list.get(ix as usize).cloned()
            };
            json!({ "LINDEX": value })
        }
        "DEL" => json!({ "DEL": lists.remove(&args[1]).map_or(0, |_| 1) }),
        cmd => return (200, error_reply(cmd, "ERR unknown command")),
    };
    (200, reply.to_string())
}

fn error_reply(cmd: &str, msg: &str) -> String {
    let mut reply = serde_json::Map::new();
    reply.insert(cmd.to_string(), json!([false, msg]));
    Value::Object(reply).to_string()
}

fn store(base_url: String) -> WebdisListStore {
    let config = WebdisConfig::default().base_url(base_url).timeout_secs(5);
    WebdisListStore::build(&config).unwrap()
}

#[test_log::test]
fn test_remote_memory_round_trip() -> Result<()> {
    let lists = Arc::new(Mutex::new(HashMap::<String, Vec<String>>::new()));
    let base_url = {
        let lists = lists.clone();
        serve(move |args| redis(&lists, args))
    };
    let mut memory = RemoteMemory::<Batch, _>::new(store(base_url), "rollouts");

    for i in 0..3 {
        memory.save_one(transition(i as f32))?;
    }
    memory.save_all(Batch::from_records(vec![transition(3.), transition(4.)]))?;
    assert_eq!(memory.len()?, 5);
    assert_eq!(lists.lock().unwrap()["rollouts"].len(), 5);

    assert_eq!(memory.get(3)?, transition(3.));
    assert_eq!(
        memory.get(5),
        Err(MemoryError::IndexOutOfRange { index: 5, len: 5 })
    );

    let items = memory.get_all_items()?;
    assert_eq!(items.len(), 5);
    assert_eq!(items.states[1], vec![1., -1.]);
    assert_eq!(items.dones, vec![false, false, false, true, true]);

    let items = memory.get_ranged_items(2, Some(4))?;
    assert_eq!(items.actions, vec![2, 3, 4]);
    assert!(memory.get_ranged_items(5, None)?.is_empty());

    memory.replace_all(Batch::from_records(vec![transition(7.)]))?;
    assert_eq!(memory.get_all_items()?.rewards, vec![7.]);

    memory.clear_memory()?;
    assert_eq!(memory.len()?, 0);
    assert!(!lists.lock().unwrap().contains_key("rollouts"));
    Ok(())
}

#[test]
fn test_unreachable_server() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let store = store(format!("http://{}", addr));
    assert!(matches!(
        store.llen("rollouts"),
        Err(MemoryError::RemoteUnavailable(_))
    ));
}

#[test]
fn test_server_error_status() {
    let store = store(serve(|_| (500, "oops".to_string())));
    assert!(matches!(
        store.rpush("rollouts", &["{}".to_string()]),
        Err(MemoryError::RemoteUnavailable(_))
    ));
}

#[test]
fn test_malformed_replies() {
    let store = store(serve(|args| match args[0].as_str() {
        "LLEN" => (200, "not json".to_string()),
        "LINDEX" => (200, json!({ "LINDEX": 3 }).to_string()),
        "LRANGE" => (200, json!({ "OTHER": [] }).to_string()),
        cmd => (200, error_reply(cmd, "WRONGTYPE")),
    }));
    assert!(matches!(store.llen("k"), Err(MemoryError::Decode(_))));
    assert!(matches!(store.lindex("k", 0), Err(MemoryError::Decode(_))));
    assert!(matches!(store.lrange("k", 0, -1), Err(MemoryError::Decode(_))));
    assert!(matches!(store.del("k"), Err(MemoryError::Decode(_))));
}

#[test]
fn test_undecodable_record() -> Result<()> {
    let lists = Arc::new(Mutex::new(HashMap::<String, Vec<String>>::new()));
    let base_url = {
        let lists = lists.clone();
        serve(move |args| redis(&lists, args))
    };
    let store = store(base_url);
    store.rpush("rollouts", &["{\"state\":".to_string()])?;

    let memory = RemoteMemory::<Batch, _>::new(store, "rollouts");
    assert_eq!(memory.len()?, 1);
    assert!(matches!(memory.get(0), Err(MemoryError::Decode(_))));
    assert!(matches!(memory.get_all_items(), Err(MemoryError::Decode(_))));
    Ok(())
}
