mod ai;
mod app;
mod audio;
mod config;
mod deck;
mod error;
mod library;
mod runtime;
mod studio;
mod task;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
