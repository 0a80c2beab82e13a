use anyhow::Context;

fn main() -> anyhow::Result<()> {
    connect_board_lib::run().context("connect-board failed")?;
    Ok(())
}
