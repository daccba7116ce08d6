//! Minimal line-mode presenter: numbered list, one prompt, then a running
//! "Currently playing" ticker on stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use wavedial_proto::station::Catalog;

use crate::driver::Driver;
use crate::status::StatusEvent;

/// Parse a 1-based selection; `None` for anything outside `1..=count`.
pub fn parse_selection(input: &str, count: usize) -> Option<usize> {
    let n: usize = input.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

pub async fn write_station_list<C: Catalog, W: AsyncWrite + Unpin>(
    catalog: &C,
    out: &mut W,
) -> anyhow::Result<()> {
    for (i, name) in catalog.rows().iter().enumerate() {
        out.write_all(format!("{:>3}. {}\n", i + 1, name).as_bytes())
            .await?;
    }
    out.flush().await?;
    Ok(())
}

/// Prompt until a valid number is entered.  `None` when input ends first.
pub async fn prompt_selection<R, W>(
    count: usize,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<Option<usize>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        out.write_all(format!("Your selection [1-{}]: ", count).as_bytes())
            .await?;
        out.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if let Some(idx) = parse_selection(&line, count) {
            return Ok(Some(idx));
        }
    }
}

/// Print status until the stream ends or the reader goes away.
pub async fn follow_status<W: AsyncWrite + Unpin>(
    status_rx: &mut mpsc::UnboundedReceiver<StatusEvent>,
    debug: bool,
    out: &mut W,
) -> anyhow::Result<()> {
    while let Some(evt) = status_rx.recv().await {
        let text = match evt {
            StatusEvent::TitleChanged(title) => format!("Currently playing: {}\n", title),
            StatusEvent::RawLine(line) if debug => format!("{}\n", line),
            StatusEvent::StreamEnded(reason) => {
                if debug {
                    out.write_all(format!("Pipe closed: {}\n", reason).as_bytes())
                        .await?;
                }
                break;
            }
            _ => continue,
        };
        out.write_all(text.as_bytes()).await?;
        out.flush().await?;
    }
    out.flush().await?;
    Ok(())
}

pub async fn run<D: Driver, C: Catalog>(
    mut driver: D,
    catalog: C,
    mut status_rx: mpsc::UnboundedReceiver<StatusEvent>,
    debug: bool,
) -> anyhow::Result<()> {
    let mut out = tokio::io::stdout();
    let mut input = BufReader::new(tokio::io::stdin());

    if catalog.is_empty() {
        out.write_all(b"No stations found.\n").await?;
        return Ok(());
    }

    write_station_list(&catalog, &mut out).await?;
    let Some(idx) = prompt_selection(catalog.len(), &mut input, &mut out).await? else {
        return Ok(());
    };
    let Some(station) = catalog.get_selected(idx) else {
        return Ok(());
    };
    info!("minimal: playing {} ({})", station.name, station.url);
    driver.play(&station.url).await?;

    tokio::select! {
        res = follow_status(&mut status_rx, debug, &mut out) => res?,
        _ = tokio::signal::ctrl_c() => info!("minimal: interrupted"),
    }

    driver.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wavedial_proto::station::{Station, StationList};

    #[test]
    fn test_parse_selection() {
        assert_eq!(parse_selection("1\n", 2), Some(0));
        assert_eq!(parse_selection(" 2 ", 2), Some(1));
        assert_eq!(parse_selection("0", 2), None);
        assert_eq!(parse_selection("3", 2), None);
        assert_eq!(parse_selection("jazz", 2), None);
    }

    #[tokio::test]
    async fn test_prompt_retries_until_valid() {
        let mut input: &[u8] = b"x\n9\n2\n";
        let mut out = Vec::new();
        let idx = prompt_selection(2, &mut input, &mut out).await.unwrap();
        assert_eq!(idx, Some(1));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Your selection [1-2]: ").count(), 3);
    }

    #[tokio::test]
    async fn test_prompt_eof() {
        let mut input: &[u8] = b"";
        let mut out = Vec::new();
        assert_eq!(prompt_selection(2, &mut input, &mut out).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_station_list_numbering() {
        let catalog = StationList::from_stations(
            PathBuf::from("unused.csv"),
            vec![Station::new("NPR", "http://a"), Station::new("Jazz", "http://b")],
        );
        let mut out = Vec::new();
        write_station_list(&catalog, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "  1. NPR\n  2. Jazz\n");
    }

    #[tokio::test]
    async fn test_follow_status_until_stream_ends() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(StatusEvent::RawLine("Cache fill: 3%".into())).unwrap();
        tx.send(StatusEvent::TitleChanged("Song A".into())).unwrap();
        tx.send(StatusEvent::VolumeChanged(40)).unwrap();
        tx.send(StatusEvent::StreamEnded("EOF".into())).unwrap();
        tx.send(StatusEvent::TitleChanged("never shown".into())).unwrap();

        let mut out = Vec::new();
        follow_status(&mut rx, false, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Currently playing: Song A\n");
    }

    #[tokio::test]
    async fn test_follow_status_debug_shows_raw_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(StatusEvent::RawLine("Cache fill: 3%".into())).unwrap();
        drop(tx);

        let mut out = Vec::new();
        follow_status(&mut rx, true, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Cache fill: 3%\n");
    }
}
