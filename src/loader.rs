//! Parallel CSV loader (C2): a single reader task splits the file into
//! line-aligned chunks of `block_size` bytes; a pool of workers parses each
//! chunk into records under a shared, mutex-guarded output vector. Grounded
//! on the source's `threadedLoad` (`0_Nested_Loop/ThreadedLoad.h`): reader
//! reads fixed-size buffers, carries a trailing partial line forward, and
//! workers drain a condvar-guarded chunk queue until `done && queue_empty`.

use crate::error::LoadError;
use crate::record::{parse_cast_line, parse_title_line, CastRecord, TitleRecord};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Load every well-formed `cast_info` line from `path` sequentially. Used as
/// the loader round-trip oracle against [`parallel_load_cast_relation`].
pub fn load_cast_relation(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<CastRecord>, LoadError> {
    load_sequential(path, limit, parse_cast_line)
}

/// Load every well-formed `title` line from `path` sequentially.
pub fn load_title_relation(path: impl AsRef<Path>, limit: Option<usize>) -> Result<Vec<TitleRecord>, LoadError> {
    load_sequential(path, limit, parse_title_line)
}

fn load_sequential<T, F>(path: impl AsRef<Path>, limit: Option<usize>, parse: F) -> Result<Vec<T>, LoadError>
where
    F: Fn(&str, usize) -> Result<T, crate::error::ParseError>,
{
    let path_ref = path.as_ref();
    let file = File::open(path_ref).map_err(|source| LoadError::Io {
        path: path_ref.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .map_err(|source| LoadError::Io {
            path: path_ref.display().to_string(),
            source,
        })?;

    let mut records = Vec::new();
    for (line_number, line) in contents.lines().skip(1).enumerate() {
        if line.is_empty() {
            continue;
        }
        match parse(line, line_number + 1) {
            Ok(record) => records.push(record),
            Err(err) => log::warn!("skipping malformed line while loading {}: {err}", path_ref.display()),
        }
        if limit.is_some_and(|limit| records.len() >= limit) {
            break;
        }
    }
    Ok(records)
}

/// Parallel-load `cast_info` records using a producer/worker-pool pipeline.
pub fn parallel_load_cast_relation(
    path: impl AsRef<Path>,
    block_size: usize,
    num_threads: usize,
) -> Result<Vec<CastRecord>, LoadError> {
    parallel_load(path, block_size, num_threads, parse_cast_line)
}

/// Parallel-load `title` records using a producer/worker-pool pipeline.
pub fn parallel_load_title_relation(
    path: impl AsRef<Path>,
    block_size: usize,
    num_threads: usize,
) -> Result<Vec<TitleRecord>, LoadError> {
    parallel_load(path, block_size, num_threads, parse_title_line)
}

struct ChunkQueue {
    chunks: Mutex<VecDeque<String>>,
    chunk_available: Condvar,
    done: Mutex<bool>,
}

/// Producer reads `block_size`-byte buffers, splits at the last newline, and
/// enqueues the aligned prefix; the trailing partial line is carried forward.
/// A pool of `num_threads` workers dequeues chunks, splits them into lines,
/// parses each, and appends to a shared, mutex-guarded output vector.
/// Malformed lines are logged and skipped, never fatal (§4.2).
fn parallel_load<T, F>(
    path: impl AsRef<Path>,
    block_size: usize,
    num_threads: usize,
    parse: F,
) -> Result<Vec<T>, LoadError>
where
    T: Send + 'static,
    F: Fn(&str, usize) -> Result<T, crate::error::ParseError> + Send + Sync + Copy + 'static,
{
    let path_ref = path.as_ref();
    let block_size = block_size.max(1);
    let mut file = match File::open(path_ref) {
        Ok(file) => file,
        Err(source) => {
            return Err(LoadError::Io {
                path: path_ref.display().to_string(),
                source,
            })
        }
    };

    let queue = Arc::new(ChunkQueue {
        chunks: Mutex::new(VecDeque::new()),
        chunk_available: Condvar::new(),
        done: Mutex::new(false),
    });
    let output: Arc<Mutex<Vec<T>>> = Arc::new(Mutex::new(Vec::new()));

    let workers: Vec<_> = (0..num_threads.max(1))
        .map(|_| {
            let queue = Arc::clone(&queue);
            let output = Arc::clone(&output);
            thread::spawn(move || worker_loop(queue, output, parse))
        })
        .collect();

    let path_display = path_ref.display().to_string();
    let read_result = drive_reader(&mut file, block_size, &queue);

    *queue.done.lock().unwrap() = true;
    queue.chunk_available.notify_all();
    for worker in workers {
        let _ = worker.join();
    }

    read_result.map_err(|source| LoadError::Io {
        path: path_display,
        source,
    })?;

    Ok(Arc::try_unwrap(output)
        .unwrap_or_else(|arc| Mutex::new(arc.lock().unwrap().drain(..).collect()))
        .into_inner()
        .unwrap())
}

fn drive_reader(file: &mut File, block_size: usize, queue: &Arc<ChunkQueue>) -> std::io::Result<()> {
    // Skip the header line.
    let mut header = vec![0u8; 1];
    let mut header_line = Vec::new();
    loop {
        let read = file.read(&mut header)?;
        if read == 0 || header[0] == b'\n' {
            break;
        }
        header_line.push(header[0]);
    }

    let mut leftover = String::new();
    let mut buffer = vec![0u8; block_size];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        let mut text = leftover.clone();
        text.push_str(&String::from_utf8_lossy(&buffer[..read]));
        leftover.clear();

        match text.rfind('\n') {
            Some(newline) => {
                leftover.push_str(&text[newline + 1..]);
                text.truncate(newline + 1);
            }
            None => {
                leftover = text;
                continue;
            }
        }

        let mut chunks = queue.chunks.lock().unwrap();
        chunks.push_back(text);
        queue.chunk_available.notify_one();
    }

    if !leftover.trim().is_empty() {
        let mut chunks = queue.chunks.lock().unwrap();
        chunks.push_back(leftover);
        queue.chunk_available.notify_one();
    }

    Ok(())
}

fn worker_loop<T, F>(queue: Arc<ChunkQueue>, output: Arc<Mutex<Vec<T>>>, parse: F)
where
    F: Fn(&str, usize) -> Result<T, crate::error::ParseError>,
{
    loop {
        let chunk = {
            let mut chunks = queue.chunks.lock().unwrap();
            loop {
                if let Some(chunk) = chunks.pop_front() {
                    break Some(chunk);
                }
                if *queue.done.lock().unwrap() {
                    break None;
                }
                chunks = queue.chunk_available.wait(chunks).unwrap();
            }
        };

        let Some(chunk) = chunk else { return };

        let mut parsed = Vec::new();
        for line in chunk.lines() {
            if line.is_empty() {
                continue;
            }
            match parse(line, 0) {
                Ok(record) => parsed.push(record),
                Err(err) => log::warn!("skipping malformed line in parallel load: {err}"),
            }
        }
        output.lock().unwrap().extend(parsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_fixture(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn missing_file_returns_load_error() {
        let err = load_cast_relation("/nonexistent/path.csv", None).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn sequential_and_parallel_loads_agree() {
        let mut contents = String::from("header\n");
        for i in 0..500 {
            contents.push_str(&format!("{i},1,{},3,note{i},4,5\n", i % 10));
        }
        let fixture = write_fixture(&contents);

        let sequential = load_cast_relation(fixture.path(), None).unwrap();
        let parallel = parallel_load_cast_relation(fixture.path(), 256, 4).unwrap();

        let mut seq_keys: Vec<_> = sequential.iter().map(|r| r.cast_info_id).collect();
        let mut par_keys: Vec<_> = parallel.iter().map(|r| r.cast_info_id).collect();
        seq_keys.sort_unstable();
        par_keys.sort_unstable();
        assert_eq!(seq_keys, par_keys);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let contents = "header\n1,2,3,4,ok,5,6\nnot,enough,fields\n7,8,9,10,ok2,11,12\n";
        let fixture = write_fixture(contents);
        let records = load_cast_relation(fixture.path(), None).unwrap();
        assert_eq!(records.len(), 2);
    }
}
