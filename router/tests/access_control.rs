//! Route matching, signatures and write grants.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::{config, node, opened, page, propose_save, query, registry, vote, Keys, Note};
use entity::{DataStore, Entity, Model, Repository, UNBOUNDED};
use governance::{CompletedRequest, Outcome, Proposal};
use router::{
    Application, NodeConfig, QueryRequest, QueryResponse, ResultCode, Route, Router,
    TransactionPayload, TransactionRequest, TransactionResponse,
};

#[test]
fn test_unregistered_signer_is_unauthenticated() {
    let (app, keys) = node();
    let hash = app.head_hash();

    let response = propose_save(&app, &keys.outsider, &Note::new(1, "atlas"));
    assert_eq!(response.code, ResultCode::Unauthenticated);
    assert_eq!(app.head_hash(), hash);
}

#[test]
fn test_signer_without_grant_is_unauthorized() {
    let (app, keys) = node();
    let hash = app.head_hash();

    let response = propose_save(&app, &keys.erin, &Note::new(1, "atlas"));
    assert_eq!(response.code, ResultCode::Unauthorized, "{}", response.log);
    assert_eq!(app.head_hash(), hash);

    // Stakeholders vote; they do not write entities directly.
    let direct = app.transact(&TransactionRequest::save(
        "/notes",
        serde_json::to_vec(&Note::new(2, "borealis")).unwrap(),
        &keys.alice,
    ));
    assert_eq!(direct.code, ResultCode::Unauthorized);
    assert_eq!(app.head_hash(), hash);
}

#[test]
fn test_tampered_payload_fails_signature_check() {
    let (app, keys) = node();
    let mut request = TransactionRequest::save(
        "/notes",
        serde_json::to_vec(&Note::new(1, "atlas")).unwrap(),
        &keys.root,
    );
    if let TransactionPayload::Save { resource } = &mut request.payload {
        resource.data = serde_json::to_vec(&Note::new(1, "forged")).unwrap();
    }

    let response = app.transact(&request);
    assert_eq!(response.code, ResultCode::Unauthenticated);
    assert_eq!(page(&query(&app, "/notes")).total_amount, 0);
}

#[test]
fn test_route_errors() {
    let (app, keys) = node();

    let nowhere = app.transact(&TransactionRequest::save("/nowhere", b"{}".to_vec(), &keys.root));
    assert_eq!(nowhere.code, ResultCode::RouteNotFound);

    let wrong_method = app.transact(&TransactionRequest::delete("/requests", &keys.alice));
    assert_eq!(wrong_method.code, ResultCode::InvalidRoute);

    assert_eq!(query(&app, "/nowhere").code, ResultCode::RouteNotFound);
    assert_eq!(query(&app, "/notes/not-a-uuid").code, ResultCode::RouteNotFound);
}

#[test]
fn test_trusted_write_grants_and_revokes_element_access() {
    let (app, keys) = node();
    let note = Note::new(1, "atlas");

    let saved = app.transact(&TransactionRequest::save(
        "/notes",
        serde_json::to_vec(&note).unwrap(),
        &keys.root,
    ));
    assert_eq!(saved.code, ResultCode::Successful, "{}", saved.log);
    assert_eq!(saved.gas_used, 1);
    let element = format!("/notes/{}", note.id);
    assert!(saved.tags.contains_key(&element));
    app.read(|store, _| {
        assert!(store.has_write_access("administrators", &keys.root.public_key().to_hex(), &element));
    });

    let duplicate = app.transact(&TransactionRequest::save(
        "/notes",
        serde_json::to_vec(&Note::new(2, "atlas")).unwrap(),
        &keys.root,
    ));
    assert_eq!(duplicate.code, ResultCode::InvalidRequest);

    let stranger = app.transact(&TransactionRequest::delete(element.clone(), &keys.alice));
    assert_eq!(stranger.code, ResultCode::Unauthorized);

    let deleted = app.transact(&TransactionRequest::delete(element.clone(), &keys.root));
    assert_eq!(deleted.code, ResultCode::Successful, "{}", deleted.log);
    assert_eq!(query(&app, &element).code, ResultCode::NotFound);

    let again = app.transact(&TransactionRequest::delete(element, &keys.root));
    assert_eq!(again.code, ResultCode::Unauthorized);
}

#[test]
fn test_entity_queries() {
    let (app, keys) = node();
    for (n, title) in [(1, "atlas"), (2, "borealis"), (3, "cygnus")] {
        let response = app.transact(&TransactionRequest::save(
            "/notes",
            serde_json::to_vec(&Note::new(n, title)).unwrap(),
            &keys.root,
        ));
        assert!(response.code.is_success(), "{}", response.log);
    }

    let second = page(&query(&app, "/notes/set/notes/1/1"));
    assert_eq!(second.total_amount, 3);
    assert_eq!(second.instances[0]["title"], "borealis");
    assert!(!second.is_last);

    let rest = page(&query(&app, "/notes/set/notes/1/-1"));
    assert_eq!(rest.instances.len(), 2);
    assert!(rest.is_last);

    let one: Note = query(&app, "/notes/intersect/notes,notes:by_title:cygnus").json().unwrap();
    assert_eq!(one, Note::new(3, "cygnus"));

    let ambiguous = query(&app, "/notes/intersect/notes");
    assert_eq!(ambiguous.code, ResultCode::InvalidRequest);

    let none = query(&app, "/notes/set/intersect/notes,notes:by_title:draco");
    assert_eq!(none.code, ResultCode::NotFound);
}

#[test]
fn test_handler_panic_rolls_back() {
    let keys = Keys::new();
    let writer = keys.root.public_key().to_hex();
    let mut store = DataStore::default();
    store.register_user(writer.clone());
    store.add_role_members("writers", [writer]);
    store.enable_write_access("writers", ["/boom"]);
    let hash = store.head_hash();

    let router = Router::builder("writers")
        .route(
            Route::save("/boom", |ctx, _| {
                ctx.store.register_user("intruder");
                panic!("handler exploded");
            })
            .unwrap(),
        )
        .route(
            Route::query("/whoami", |ctx| {
                let body = if ctx.signature_valid { "valid" } else { "invalid" };
                Ok(QueryResponse::success(ctx.path, body.as_bytes().to_vec()))
            })
            .unwrap(),
        )
        .build();
    let app = Application::new(store, Arc::new(registry()), router);

    let response: TransactionResponse = app.transact(&TransactionRequest::save("/boom", Vec::new(), &keys.root));
    assert_eq!(response.code, ResultCode::ServerError);
    assert!(response.log.contains("handler exploded"));
    assert_eq!(app.head_hash(), hash);
    app.read(|store, _| assert!(!store.users().contains("intruder")));

    // A bad query signature is reported to the handler, not rejected.
    let mut request = QueryRequest::new("/whoami", &keys.alice);
    request.signature = keys.bob.sign(b"something else");
    assert_eq!(app.query(&request).value, b"invalid");
    assert_eq!(app.query(&QueryRequest::new("/whoami", &keys.alice)).value, b"valid");
}

#[test]
fn test_check_transact_leaves_store_untouched() {
    let (app, keys) = node();
    let hash = app.head_hash();
    let note = Note::new(1, "atlas");
    let request = TransactionRequest::save("/notes", serde_json::to_vec(&note).unwrap(), &keys.root);

    let dry = app.check_transact(&request);
    assert_eq!(dry.code, ResultCode::Successful, "{}", dry.log);
    assert_eq!(app.head_hash(), hash);
    assert_eq!(query(&app, &format!("/notes/{}", note.id)).code, ResultCode::NotFound);

    let real = app.transact(&request);
    assert_eq!(real.tags, dry.tags);
    assert_ne!(app.head_hash(), hash);
}

#[test]
fn test_commit_reports_height_and_head_hash() {
    let (app, keys) = node();
    let first = app.commit();
    assert_eq!(first.height, 1);
    assert_eq!(first.app_hash, app.head_hash());

    let request = TransactionRequest::save(
        "/notes",
        serde_json::to_vec(&Note::new(1, "atlas")).unwrap(),
        &keys.root,
    );
    assert!(app.transact(&request).code.is_success());

    let second = app.commit();
    assert_eq!(second.height, 2);
    assert_ne!(second.app_hash, first.app_hash);
}

#[test]
fn test_concurrent_queries_see_committed_state() {
    let (app, keys) = node();
    let alice = keys.alice.public_key().to_hex();
    let writing = AtomicBool::new(true);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            let mut failures = Vec::new();
            for n in 0..6 {
                let direct = app.transact(&TransactionRequest::save(
                    "/notes",
                    serde_json::to_vec(&Note::new(n, &format!("direct-{}", n))).unwrap(),
                    &keys.root,
                ));
                let proposal = propose_save(&app, &keys.alice, &Note::new(100 + n, &format!("voted-{}", n)));
                let mut responses = vec![direct];
                if proposal.code.is_success() {
                    let request = opened(&proposal);
                    responses.push(vote(&app, &keys.alice, request, true));
                    responses.push(vote(&app, &keys.bob, request, true));
                }
                responses.push(proposal);
                failures.extend(responses.into_iter().filter(|r| !r.code.is_success()).map(|r| r.log));
            }
            // Readers stop on this flag, so set it before asserting.
            writing.store(false, Ordering::SeqCst);
            assert!(failures.is_empty(), "{:?}", failures);
        });

        for _ in 0..4 {
            scope.spawn(|| {
                let mut seen = 0;
                loop {
                    let done = !writing.load(Ordering::SeqCst);

                    let notes = page(&query(&app, "/notes/set/notes/0/-1"));
                    assert_eq!(notes.total_amount, notes.instances.len());
                    assert!(notes.total_amount >= seen);
                    seen = notes.total_amount;

                    // Completed first: a request never reopens, so overlap means a torn read.
                    let completed = request_ids(&query(&app, "/completed-requests/set/0/-1"));
                    let active = request_ids(&query(&app, "/requests/set/0/-1"));
                    assert!(completed.iter().all(|id| !active.contains(id)));

                    app.read(|store, registry| {
                        let repository = Repository::new(store, registry);
                        let resolved = repository
                            .fetch_set_by_keyname::<CompletedRequest>(CompletedRequest::KEYNAME, 0, UNBOUNDED)
                            .unwrap();
                        for entry in resolved.instances() {
                            assert_eq!(entry.outcome, Outcome::Committed);
                            if let Proposal::Save(ins) = &entry.request.proposal {
                                assert!(repository.exists(Note::KEYNAME, ins.id()));
                            }
                        }
                    });

                    let user: serde_json::Value = query(&app, &format!("/users/{}", alice)).json().unwrap();
                    assert_eq!(user["shares"], 60);

                    if done {
                        break;
                    }
                }
            });
        }
    });

    assert_eq!(page(&query(&app, "/notes")).total_amount, 12);
    assert_eq!(page(&query(&app, "/completed-requests")).total_amount, 6);
    assert_eq!(page(&query(&app, "/requests")).total_amount, 0);
}

fn request_ids(response: &QueryResponse) -> Vec<serde_json::Value> {
    page(response)
        .instances
        .iter()
        .map(|entry| entry["request"]["id"].clone())
        .collect()
}

#[test]
fn test_node_from_yaml_file() {
    let keys = Keys::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node.yaml");
    config(&keys).save(&path).unwrap();

    let loaded = NodeConfig::load(&path).unwrap();
    assert_eq!(loaded, config(&keys));

    let app = Application::from_config(&loaded, registry()).unwrap();
    app.read(|store, _| {
        assert_eq!(store.users().len(), 6);
        assert!(store.has_write_access(
            "stakeholders",
            &keys.dave.public_key().to_hex(),
            "/requests"
        ));
    });
}

#[test]
fn test_genesis_rejects_bad_bootstrap() {
    let keys = Keys::new();

    let mut unknown_member = config(&keys);
    unknown_member.genesis.roles[0].members.push("mallory".into());
    assert!(Application::from_config(&unknown_member, registry()).is_err());

    let mut bad_key = config(&keys);
    bad_key.genesis.stakeholders[0].public_key = "not hex".into();
    assert!(Application::from_config(&bad_key, registry()).is_err());

    let mut bad_pattern = config(&keys);
    bad_pattern.genesis.roles[1].write_patterns.push("(".into());
    assert!(Application::from_config(&bad_pattern, registry()).is_err());

    let mut short_name = config(&keys);
    short_name.genesis.stakeholders[0].name = "al".into();
    short_name.genesis.roles[0].members[0] = "al".into();
    assert!(Application::from_config(&short_name, registry()).is_err());
}
