use cafe_orders_api::razorpay::{RazorpayClient, verify_signature};
use hmac::{Hmac, Mac};
use sha2::Sha256;

fn sign(secret: &str, intent_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(format!("{intent_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn accepts_the_gateway_signature() {
    let sig = sign("test_secret", "order_abc", "pay_xyz");
    assert!(verify_signature("test_secret", "order_abc", "pay_xyz", &sig));
}

#[test]
fn client_agrees_with_the_free_function() {
    let client = RazorpayClient::new("rzp_test_key".into(), "test_secret".into());
    let sig = sign("test_secret", "order_abc", "pay_xyz");
    assert!(client.verify_signature("order_abc", "pay_xyz", &sig));
}

#[test]
fn rejects_a_tampered_signature() {
    let sig = sign("test_secret", "order_abc", "pay_xyz");
    let mut tampered: Vec<char> = sig.chars().collect();
    tampered[0] = if tampered[0] == '0' { '1' } else { '0' };
    let tampered: String = tampered.into_iter().collect();

    assert!(!verify_signature("test_secret", "order_abc", "pay_xyz", &tampered));
}

#[test]
fn rejects_a_signature_for_another_payment() {
    let sig = sign("test_secret", "order_abc", "pay_xyz");
    assert!(!verify_signature("test_secret", "order_abc", "pay_other", &sig));
    assert!(!verify_signature("test_secret", "order_other", "pay_xyz", &sig));
}

#[test]
fn rejects_a_signature_from_the_wrong_secret() {
    let sig = sign("other_secret", "order_abc", "pay_xyz");
    assert!(!verify_signature("test_secret", "order_abc", "pay_xyz", &sig));
}

#[test]
fn rejects_garbage_signatures() {
    assert!(!verify_signature("test_secret", "order_abc", "pay_xyz", ""));
    assert!(!verify_signature(
        "test_secret",
        "order_abc",
        "pay_xyz",
        "not hex at all"
    ));
}
