use crate::transport::Transport;
use anyhow::Result;
use powledger_core::{Operation, Request, Response};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

pub const MENU: &str = "\
0. View basic blockchain status.
1. Add a transaction to the blockchain.
2. Verify the blockchain.
3. View the blockchain.
4. Corrupt the chain.
5. Hide the corruption by repairing the chain.
6. Exit";

/// Prompt for operations on `input` until the user picks 6 or input ends.
///
/// Choice 6 never reaches the node; dropping the transport is the disconnect.
pub async fn run<T, R, W>(transport: &mut T, input: R, out: &mut W) -> Result<()>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut input = input.lines();
    loop {
        writeln!(out, "{MENU}")?;
        out.flush()?;
        let Some(choice) = input.next_line().await? else {
            break;
        };
        let Ok(operation) = choice.parse::<Operation>() else {
            writeln!(out, "Wrong choice.")?;
            continue;
        };

        let request = match operation {
            Operation::Disconnect => break,
            Operation::AddTransaction => {
                let Some(difficulty) = prompt(&mut input, out, "Enter difficulty > 0").await? else {
                    break;
                };
                let Ok(difficulty) = difficulty.trim().parse::<u32>() else {
                    writeln!(out, "Difficulty must be a non-negative number.")?;
                    continue;
                };
                let Some(data) = prompt(&mut input, out, "Enter transaction").await? else {
                    break;
                };
                Request::add_transaction(difficulty, data)
            }
            Operation::Corrupt => {
                writeln!(out, "corrupt the Blockchain")?;
                let Some(id) = prompt(&mut input, out, "Enter block ID of block to corrupt").await?
                else {
                    break;
                };
                let Ok(id) = id.trim().parse::<usize>() else {
                    writeln!(out, "Block ID must be a non-negative number.")?;
                    continue;
                };
                let label = format!("Enter new data for block {id}");
                let Some(data) = prompt(&mut input, out, &label).await? else {
                    break;
                };
                Request::corrupt(id, data)
            }
            other => Request::new(other),
        };

        let response = transport.exchange(&request).await?;
        render(out, operation, &request, &response)?;
    }
    Ok(())
}

async fn prompt<R, W>(input: &mut Lines<R>, out: &mut W, label: &str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(out, "{label}")?;
    out.flush()?;
    Ok(input.next_line().await?)
}

fn render<W: Write>(
    out: &mut W,
    operation: Operation,
    request: &Request,
    response: &Response,
) -> Result<()> {
    if let Some(error) = &response.error {
        writeln!(out, "Request failed: {error}")?;
        return Ok(());
    }
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    match operation {
        Operation::Status => {
            writeln!(out, "Current Size of chain: {}", field(&response.chain_size))?;
            writeln!(
                out,
                "Difficulty of most recent block: {}",
                field(&response.recent_difficulty)
            )?;
            writeln!(
                out,
                "Total difficulty for all blocks: {}",
                field(&response.total_difficulty)
            )?;
            writeln!(
                out,
                "Approximate hashes per second on this machine: {}",
                field(&response.hashes_per_second)
            )?;
            writeln!(
                out,
                "Expected total hashes required for the whole chain: {}",
                field(&response.total_expected_hashes)
            )?;
            writeln!(out, "Nonce for the most recent block: {}", field(&response.nonce))?;
            writeln!(out, "Chain hash: {}", field(&response.chain_hash))?;
        }
        Operation::AddTransaction => writeln!(
            out,
            "Total execution time to add this block was {} milliseconds",
            field(&response.elapsed_time)
        )?,
        Operation::Verify => {
            writeln!(
                out,
                "Chain verification: {}",
                field(&response.verification_result)
            )?;
            writeln!(
                out,
                "Total execution time to verify the chain was {} milliseconds",
                field(&response.elapsed_time)
            )?;
        }
        Operation::View => {
            writeln!(out, "View the blockchain")?;
            writeln!(out, "{}", field(&response.rendered_chain))?;
        }
        Operation::Corrupt => writeln!(
            out,
            "Block {} now holds {}",
            field(&request.block_index),
            field(&request.data)
        )?,
        Operation::Repair => writeln!(
            out,
            "Total execution time required to repair the chain was {} milliseconds",
            field(&response.elapsed_time)
        )?,
        Operation::Disconnect => {}
    }
    Ok(())
}
