use crate::config::ACCEPT_POLL;
use crate::context::ServerContext;
use crate::error::ServerError;
use crate::session::{SessionEnd, run_session};
use crate::tracker::ConnGuard;
use log::{debug, info, warn};
use std::io;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::thread;

/// Забиндить listener. Ошибка тут фатальна для процесса.
pub(crate) fn bind_listener(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
    // неблокирующий accept: так цикл видит отмену, не застревая в accept()
    listener
        .set_nonblocking(true)
        .map_err(ServerError::Listener)?;
    Ok(listener)
}

/// Accept-цикл. Крутится до отмены, на каждое соединение поднимает
/// отдельный поток с тиковой сессией.
///
/// После отмены listener закрывается (drop), а ещё не завершённые
/// потоки сессий возвращаются наверх, чтобы их дождаться.
pub(crate) fn run_tcp_listener(
    listener: TcpListener,
    ctx: ServerContext,
) -> Vec<thread::JoinHandle<()>> {
    let mut session_handles = Vec::new();

    loop {
        reap_finished_sessions(&mut session_handles);

        if ctx.cancel.is_cancelled() {
            info!("stop accepting new connections");
            break;
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                if ctx.cancel.is_cancelled() {
                    // отмена пришла между проверкой и accept: не обслуживаем
                    debug!("closing {peer}: shutdown in progress");
                    stream.shutdown(Shutdown::Both).ok();
                    break;
                }

                match spawn_session(stream, peer, &ctx) {
                    Ok(h) => session_handles.push(h),
                    Err(e) => warn!("failed to start session for {peer}: {e}"),
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                // нет новых соединений прямо сейчас
                ctx.cancel.wait_timeout(ACCEPT_POLL);
            }
            Err(e) if ctx.cancel.is_cancelled() => {
                debug!("accept error during shutdown: {e}");
            }
            Err(e) => {
                warn!("accept error: {e}");
                ctx.cancel.wait_timeout(ACCEPT_POLL);
            }
        }
    }

    drop(listener);
    session_handles
}

fn reap_finished_sessions(handles: &mut Vec<thread::JoinHandle<()>>) {
    let mut i = 0;
    while i < handles.len() {
        if handles[i].is_finished() {
            let h = handles.swap_remove(i);
            if let Err(panic) = h.join() {
                warn!("session thread panicked: {:?}", panic);
            }
        } else {
            i += 1;
        }
    }
}

fn configure_stream(stream: &TcpStream, ctx: &ServerContext) -> io::Result<()> {
    // accept на неблокирующем listener может отдать неблокирующий сокет
    stream.set_nonblocking(false)?;
    stream.set_nodelay(true).ok();
    stream.set_write_timeout(Some(ctx.write_timeout))?;
    if let Err(e) = tick_core::net::enable_keepalive(stream, ctx.keepalive) {
        warn!("failed to enable keep-alive: {e}");
    }
    Ok(())
}

fn spawn_session(
    stream: TcpStream,
    peer: SocketAddr,
    ctx: &ServerContext,
) -> io::Result<thread::JoinHandle<()>> {
    configure_stream(&stream, ctx)?;

    let guard = ctx.tracker.register(stream.try_clone().ok());
    let cid = guard.id();
    info!(
        "conn {cid}: accepted {peer} (outstanding={})",
        ctx.tracker.outstanding()
    );

    let ctx = ctx.clone();
    // если spawn не удался, guard дропнется вместе с замыканием
    thread::Builder::new()
        .name(format!("session-{cid}"))
        .spawn(move || handle_conn(stream, peer, guard, ctx))
}

fn handle_conn(mut stream: TcpStream, peer: SocketAddr, guard: ConnGuard, ctx: ServerContext) {
    let cid = guard.id();

    let source = match ctx.delivery.open(cid) {
        Ok(s) => s,
        Err(e) => {
            warn!("conn {cid}: {e}");
            stream.shutdown(Shutdown::Both).ok();
            return;
        }
    };

    let report = run_session(
        cid,
        &mut stream,
        &*source,
        ctx.clock.as_ref(),
        ctx.tick_interval,
        &ctx.cancel,
    );
    ctx.delivery.close(cid);

    match &report.end {
        SessionEnd::Cancelled => info!(
            "conn {cid}: closing {peer} on shutdown (ticks={}, messages={})",
            report.ticks, report.messages
        ),
        SessionEnd::WriteFailed(e) if ctx.cancel.is_cancelled() => {
            debug!("conn {cid}: write to {peer} failed during shutdown: {e}")
        }
        SessionEnd::WriteFailed(e) => warn!(
            "conn {cid}: write to {peer} failed: {e}; closing (ticks={}, messages={})",
            report.ticks, report.messages
        ),
    }

    stream.shutdown(Shutdown::Both).ok();
    drop(stream);
    // только теперь соединение считается завершённым
    drop(guard);
}
