// SPDX-FileCopyrightText: 2026 Hackportal Authors
//
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::{convert::Infallible, error::Error, net::SocketAddr, sync::Arc};

use diesel::Connection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use ed25519_dalek::SigningKey;
use hyper::{Method, Response, StatusCode, service::service_fn};
use hyper_util::rt::{TokioExecutor, TokioIo};
use juniper::{EmptySubscription, RootNode};
use juniper_hyper::{graphiql, graphql, playground};
use tokio::net::TcpListener;

use hackportal_api::config::Config;
use hackportal_api::db;
use hackportal_api::graphql::{
    self, AuthenticatedUser, BaseContext, Context, Mutation, Query, Schema,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    let root_node: Arc<Schema> = Arc::new(RootNode::new(Query, Mutation, EmptySubscription::new()));

    let addr = SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(addr).await?;

    let signing_key = load_or_generate_signing_key(&config.signing_key_file)?;

    {
        let mut pg_connection = diesel::pg::PgConnection::establish(&config.database_url)?;
        db::run_migrations(&mut pg_connection)?;
    }

    let ctx = BaseContext {
        db_pool: {
            let manager = AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new(
                &config.database_url,
            );
            diesel_async::pooled_connection::bb8::Pool::builder()
                .build(manager)
                .await?
        },
        keypair: signing_key,
        config: Arc::new(config),
        http_client: reqwest::Client::new(),
    };

    tracing::info!("Listening on http://{addr}");
    loop {
        let (stream, remote_addr) = listener.accept().await?;

        let io = TokioIo::new(stream);

        let root_node = root_node.clone();
        let ctx = ctx.clone();

        tokio::spawn(async move {
            if let Err(e) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                .serve_connection(
                    io,
                    service_fn(move |req| {
                        let root_node = root_node.clone();
                        let remote_ip = client_ip(remote_addr.ip(), req.headers());

                        let user_details = bearer_token(req.headers()).and_then(|token| {
                            graphql::auth::parse_and_validate_jwt::<graphql::auth::AuthJwtPayload>(
                                &token,
                                &ctx.keypair.verifying_key(),
                            )
                            .ok()
                            .map(|jwt| AuthenticatedUser {
                                role: jwt.custom_fields.role,
                                name: jwt.custom_fields.name,
                                email: jwt.custom_fields.email,
                                user_id: jwt.sub,
                            })
                        });

                        let ctx = Context::new(
                            ctx.clone(),
                            remote_ip,
                            req.headers()
                                .get("user-agent")
                                .and_then(|ua| ua.to_str().ok())
                                .unwrap_or("unknown")
                                .to_string(),
                            user_details,
                        );

                        async {
                            Ok::<_, Infallible>(match (req.method(), req.uri().path()) {
                                (&Method::GET, "/graphql") | (&Method::POST, "/graphql") => {
                                    graphql(root_node, Arc::new(ctx), req).await
                                }
                                (&Method::OPTIONS, "/graphql") => {
                                    let mut resp = Response::new(String::new());
                                    *resp.status_mut() = StatusCode::NO_CONTENT;
                                    resp
                                }
                                (&Method::GET, "/graphiql") => graphiql("/graphql", None).await,
                                (&Method::GET, "/playground") => playground("/graphql", None).await,
                                _ => {
                                    let mut resp = Response::new(String::new());
                                    *resp.status_mut() = StatusCode::NOT_FOUND;
                                    resp
                                }
                            })
                        }
                    }),
                )
                .await
            {
                tracing::error!("Error serving connection: {e}");
            }
        });
    }
}

fn load_or_generate_signing_key(path: &str) -> Result<SigningKey, Box<dyn Error + Send + Sync>> {
    let key_file = std::path::Path::new(path);
    if !key_file.exists() {
        let mut csprng = rand::rngs::OsRng;
        let signing_key: SigningKey = SigningKey::generate(&mut csprng);
        let keypair_json = serde_json::to_string_pretty(&signing_key)?;
        std::fs::write(key_file, keypair_json)?;
        tracing::info!("Generated new signing key and saved to {path}");
    }
    let keypair_json = std::fs::read_to_string(key_file)?;
    let signing_key: SigningKey = serde_json::from_str(&keypair_json)?;
    Ok(signing_key)
}

fn bearer_token(headers: &hyper::HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

fn is_private(ip: std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(ipv4) => ipv4.is_private(),
        std::net::IpAddr::V6(ipv6) => ipv6.is_unique_local(),
    }
}

/// When the peer is a private-range proxy, the first public entry of
/// x-forwarded-for is the real client; otherwise trust the socket address.
fn client_ip(remote_ip: std::net::IpAddr, headers: &hyper::HeaderMap) -> std::net::IpAddr {
    if !is_private(remote_ip) {
        return remote_ip;
    }
    let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) else {
        return remote_ip;
    };
    xff.split(',')
        .filter_map(|entry| entry.trim().parse::<std::net::IpAddr>().ok())
        .find(|ip| !is_private(*ip))
        .unwrap_or(remote_ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_public_peer_wins() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        let peer: std::net::IpAddr = "198.51.100.2".parse().unwrap();
        assert_eq!(client_ip(peer, &headers), peer);
    }

    #[test]
    fn test_client_ip_behind_private_proxy() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.0.3, 203.0.113.7".parse().unwrap());
        let peer: std::net::IpAddr = "192.168.1.1".parse().unwrap();
        let expected: std::net::IpAddr = "203.0.113.7".parse().unwrap();
        assert_eq!(client_ip(peer, &headers), expected);
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = hyper::HeaderMap::new();
        headers.insert("authorization", "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));

        let mut headers = hyper::HeaderMap::new();
        headers.insert("authorization", "Basic dXNlcg==".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
