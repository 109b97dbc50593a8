//! UCI stdin/stdout driver binary.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use chess_engine::board::SearchIterationInfo;
use chess_engine::engine::{
    time::{SearchRequest, TimeConfig, TimeControl},
    EngineController, SearchParams,
};
use chess_engine::uci::command::{parse_go_params, parse_uci_command, UciCommand};
use chess_engine::uci::options::{parse_setoption, UciOptionAction, UciOptions};
use chess_engine::uci::report::{print_bestmove, print_ready};
use chess_engine::uci::parse_position_command;

fn print_iteration_info(info: &SearchIterationInfo) {
    let score = info
        .mate_in
        .map_or_else(|| format!("cp {}", info.score), |m| format!("mate {m}"));
    println!(
        "info depth {} seldepth {} multipv {} score {} nodes {} nps {} time {} pv {}",
        info.depth, info.seldepth, info.multipv, score, info.nodes, info.nps, info.time_ms, info.pv
    );
    io::stdout().flush().ok();
}

fn time_config(options: &UciOptions) -> TimeConfig {
    TimeConfig {
        move_overhead_ms: options.move_overhead_ms,
        soft_time_percent: options.soft_time_percent,
        hard_time_percent: options.hard_time_percent,
        default_max_nodes: options.default_max_nodes,
    }
}

fn build_search_params(parts: &[String], options: &UciOptions) -> SearchParams {
    let str_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
    let go = parse_go_params(&str_parts);

    let time_control = if let Some(movetime) = go.movetime {
        TimeControl::move_time_ms(movetime)
    } else if go.wtime.is_some() || go.btime.is_some() {
        TimeControl::Incremental {
            time_left_ms: go.wtime.or(go.btime).unwrap_or(0),
            inc_ms: go.winc.or(go.binc).unwrap_or(0),
            movestogo: go.movestogo,
        }
    } else if go.depth.is_some() {
        TimeControl::Depth
    } else {
        TimeControl::Infinite
    };

    let (req, _): (SearchRequest, _) = chess_engine::engine::build_search_request(
        time_control,
        go.depth,
        go.nodes,
        go.ponder,
        go.infinite,
        &time_config(options),
    );

    SearchParams {
        depth: req.depth,
        soft_time_ms: req.soft_time_ms,
        hard_time_ms: req.hard_time_ms,
        ponder: req.ponder,
        infinite: req.infinite,
        multi_pv: options.multi_pv,
    }
}

fn run_uci_loop() {
    let mut options = UciOptions::new(chess_engine::board::DEFAULT_TT_MB);
    let mut controller = EngineController::new(options.hash_mb);
    controller.set_info_callback(Some(Arc::new(print_iteration_info)));

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let Some(command) = parse_uci_command(&line) else {
            continue;
        };

        match command {
            UciCommand::Uci => {
                let params = controller
                    .with_search_state_ref(|state| state.params().clone())
                    .unwrap_or_default();
                options.print(&params);
            }
            UciCommand::IsReady => {
                controller.stop_search();
                print_ready();
            }
            UciCommand::UciNewGame => {
                controller.new_game();
            }
            UciCommand::Position(parts) => {
                let str_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                let mut board = controller.board().clone();
                parse_position_command(&mut board, &str_parts);
                controller.set_board(board);
            }
            UciCommand::Go(parts) => {
                let params = build_search_params(&parts, &options);
                controller.start_search(params, |result| {
                    print_bestmove(result.best_move);
                    io::stdout().flush().ok();
                });
            }
            UciCommand::Perft(depth) => {
                let mut board = controller.board().clone();
                let nodes = board.perft(depth);
                println!("info string perft {depth} nodes {nodes}");
            }
            UciCommand::SetOption(parts) => {
                let str_parts: Vec<&str> = parts.iter().map(String::as_str).collect();
                if let Some((name, value)) = parse_setoption(&str_parts) {
                    let action = controller.with_search_state(|state| {
                        options.apply_setoption(&name, value.as_deref(), state)
                    });
                    match action.flatten() {
                        Some(UciOptionAction::ReinitHash(mb)) => controller.resize_hash(mb),
                        Some(UciOptionAction::SetThreads(n)) => controller.set_threads(n),
                        None => {}
                    }
                }
            }
            UciCommand::Debug(_) => {}
            UciCommand::Stop => {
                controller.signal_stop();
            }
            UciCommand::PonderHit => {
                controller.ponderhit();
            }
            UciCommand::Quit => {
                controller.stop_search();
                break;
            }
            UciCommand::Unknown(line) => {
                if line.trim() == "d" {
                    println!("{}", controller.board().to_fen());
                }
            }
        }
        io::stdout().flush().ok();
    }
}

fn main() {
    run_uci_loop();
}
