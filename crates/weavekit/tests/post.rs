//! End-to-end posting against the in-memory gateway.

use weavekit::client::{Call, ClientError};
use weavekit::core::{
    b64url_encode, generate_transaction_chunks, Sha256Hash, TransactionJson, MAX_CHUNK_SIZE,
};
use weavekit::{Amount, Assembly, AssemblyState, Format, Transaction, TransactionId, WeaveError};
use weavekit_testkit::{pattern, shared_gateway_fixtures, TestFixture, ANCHOR, PRICE};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn hello_world_is_one_chunk_in_the_body() {
    init_tracing();
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let posted = weave.upload(&b"hello world"[..]).await.unwrap();
    let tx = &posted.transaction;

    assert_eq!(posted.response, b"OK");
    assert_eq!(posted.chunks_uploaded, 0);
    assert_eq!(tx.format(), Format::V2);
    assert_eq!(tx.data_size(), 11);
    assert_eq!(tx.reward(), Some(Amount::from_winston(PRICE)));
    assert_eq!(b64url_encode(tx.last_tx()), ANCHOR);

    let chunks = tx.chunks().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks.chunks[0].range(), 0..11);

    // A single chunk's root is its leaf id
    let mut note = [0u8; 32];
    note[31] = 11;
    let leaf = Sha256Hash::hash_all(&[
        Sha256Hash::hash(Sha256Hash::hash(b"hello world").as_ref()).as_ref(),
        Sha256Hash::hash(&note).as_ref(),
    ]);
    assert_eq!(tx.data_root(), leaf.as_bytes().as_slice());

    assert_eq!(posted.id, TransactionId::from_signature(tx.signature()));
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 1);
    assert_eq!(fixture.gateway.calls(Call::PostChunk).await, 0);
}

#[tokio::test]
async fn large_payload_uploads_every_chunk() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();
    let data = pattern(2 * MAX_CHUNK_SIZE + 1);

    let posted = weave.upload(data.clone()).await.unwrap();
    assert_eq!(posted.chunks_uploaded, 3);

    let uploads = fixture.gateway.uploaded_chunks().await;
    assert_eq!(uploads.len(), 3);

    let expected = generate_transaction_chunks(&data);
    for (upload, proof) in uploads.iter().zip(&expected.proofs) {
        assert_eq!(upload.offset, proof.offset.to_string());
        assert_eq!(upload.data_size, data.len().to_string());
        assert_eq!(upload.data_root, b64url_encode(expected.data_root_bytes()));
    }
}

#[tokio::test]
async fn unsigned_commit_reaches_no_gateway() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let mut assembly = Assembly::new(Transaction::from_data(&b"unsigned"[..]));
    let err = weave.assembler().commit(&mut assembly).await.unwrap_err();

    assert!(matches!(err, ClientError::MissingSignature));
    assert_eq!(assembly.state(), AssemblyState::Draft);
    assert_eq!(fixture.gateway.total_calls().await, 0);
}

#[tokio::test]
async fn reassembly_keeps_message_but_not_signature() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let first = weave.sign(Transaction::from_data(&b"payload"[..])).await.unwrap();
    let second = weave.sign(first.clone().into_draft()).await.unwrap();

    // Same anchor and price give the same message to sign
    assert_eq!(
        first.signature_data().unwrap(),
        second.signature_data().unwrap()
    );
    // PSS salts every signature
    assert_ne!(first.signature(), second.signature());
    assert_ne!(first.id(), second.id());
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 0);
}

#[tokio::test]
async fn failed_commit_retries_as_fresh_draft() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();
    let assembler = weave.assembler();

    fixture.gateway.fail_on(Call::Submit).await;
    let mut assembly = Assembly::new(Transaction::from_data(&b"retry me"[..]));
    let err = assembler.post(&mut assembly, &fixture.wallet).await.unwrap_err();
    assert!(matches!(err, ClientError::Commit(_)));
    assert!(assembly.state().is_failed());
    let failed_id = *assembly.transaction().id().unwrap();

    fixture.gateway.recover(Call::Submit).await;
    let mut retry = assembly.retry().unwrap();
    assert_eq!(retry.state(), AssemblyState::Draft);
    assembler.post(&mut retry, &fixture.wallet).await.unwrap();

    assert_eq!(retry.state(), AssemblyState::Committed);
    assert_ne!(retry.transaction().id(), Some(&failed_id));
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 2);
    assert_eq!(fixture.gateway.submitted().await.len(), 1);
}

#[tokio::test]
async fn anchor_failure_surfaces_through_weave() {
    let fixture = TestFixture::new();
    fixture.gateway.fail_on(Call::Anchor).await;

    let err = fixture.weave().upload(&b"x"[..]).await.unwrap_err();
    assert!(matches!(err, WeaveError::Client(ClientError::Anchor(_))));
    assert_eq!(fixture.gateway.calls(Call::Price).await, 0);
}

#[tokio::test]
async fn transfer_carries_target_and_quantity() {
    let parties = shared_gateway_fixtures(2);
    let sender = parties[0].weave();
    let recipient = parties[1].address();

    let posted = sender
        .transfer(Amount::from_winston(1_000), recipient.clone())
        .await
        .unwrap();
    let tx = &posted.transaction;

    assert_eq!(tx.target(), Some(&recipient));
    assert_eq!(tx.quantity(), Amount::from_winston(1_000));
    assert_eq!(tx.data_size(), 0);
    assert!(tx.data_root().is_empty());
    assert_eq!(posted.chunks_uploaded, 0);
}

#[tokio::test]
async fn signed_transaction_can_be_submitted_later() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let tx = weave
        .data(&b"tagged"[..])
        .tag("Content-Type", "text/plain")
        .build();
    let signed = weave.sign(tx).await.unwrap();
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 0);

    let posted = weave.submit(signed.clone()).await.unwrap();
    assert_eq!(Some(&posted.id), signed.id());
    assert_eq!(posted.transaction.tags()[0].value, "text/plain");
    assert_eq!(fixture.gateway.calls(Call::Anchor).await, 1);
}

#[tokio::test]
async fn decoded_large_transaction_uploads_its_chunks() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let signed = weave.sign(Transaction::from_data(pattern(MAX_CHUNK_SIZE + 1))).await.unwrap();
    let mut json = TransactionJson::from(&signed);
    assert!(json.data.is_empty());
    json.data = b64url_encode(signed.data());
    let received = Transaction::try_from(json).unwrap();
    assert!(received.chunks().is_none());

    let posted = weave.submit(received).await.unwrap();
    assert_eq!(posted.chunks_uploaded, 2);
    assert_eq!(fixture.gateway.calls(Call::PostChunk).await, 2);
    assert_eq!(fixture.gateway.uploaded_chunks().await.len(), 2);
}

#[tokio::test]
async fn transaction_without_its_payload_is_not_submitted() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();

    let signed = weave.sign(Transaction::from_data(pattern(MAX_CHUNK_SIZE + 1))).await.unwrap();
    let received = Transaction::try_from(TransactionJson::from(&signed)).unwrap();

    let err = weave.submit(received).await.unwrap_err();
    assert!(matches!(
        err,
        WeaveError::Client(ClientError::MissingPayload { .. })
    ));
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 0);
}

#[tokio::test]
async fn failed_chunk_upload_keeps_committed_transaction() {
    let fixture = TestFixture::new();
    let weave = fixture.weave();
    fixture.gateway.fail_on(Call::PostChunk).await;

    let err = weave.upload(pattern(2 * MAX_CHUNK_SIZE + 1)).await.unwrap_err();
    let posted = match err {
        WeaveError::Upload { posted, source } => {
            assert!(matches!(source, ClientError::ChunkUpload { index: 0, .. }));
            *posted
        }
        other => panic!("unexpected error {:?}", other),
    };
    assert_eq!(posted.chunks_uploaded, 0);
    assert_eq!(posted.response, b"OK");
    assert_eq!(fixture.gateway.submitted().await[0].id(), Some(&posted.id));

    fixture.gateway.recover(Call::PostChunk).await;
    let resumed = weave.resume_upload(posted).await.unwrap();
    assert_eq!(resumed.chunks_uploaded, 3);
    assert_eq!(fixture.gateway.uploaded_chunks().await.len(), 3);
    assert_eq!(fixture.gateway.calls(Call::Submit).await, 1);
}
