pub mod generic_ring_buffer{

    use near_sdk::collections::LookupMap;
    use near_sdk::IntoStorageKey;
    use borsh::{BorshDeserialize, BorshSerialize};

    pub trait Identifier<T>{
        fn id(&self) -> T;
    }

    pub trait RingBuffer<TID: BorshDeserialize + BorshSerialize, T : Copy + Identifier<TID>>{
        /// calculate next index
        fn next_index(&self) -> usize;
        /// adds element to the buffer, evicting the oldest one when full
        fn add(&mut self, element: &T);
        /// return the element at index
        fn get_by_index(&self, idx: usize) -> Option<T>;
        fn get_by_identifier(&self, id: &TID) -> Option<T>;
        /// newest first
        fn latest(&self, from_index: usize, limit: usize) -> Vec<T>;
    }

    #[derive(BorshSerialize, BorshDeserialize)]
    pub struct GenericRingBuffer<T, TID, const CAPACITY: usize>{
        arr: Vec<Option<T>>,
        current_index: usize,
        len: usize,
        id_idx_map: LookupMap<TID, usize>,
    }

    impl<TID: BorshDeserialize + BorshSerialize, T: Copy + Identifier<TID>, const CAPACITY: usize> GenericRingBuffer<T, TID, CAPACITY>{
        pub fn new<S: IntoStorageKey>(prefix: S) -> Self{
            assert_ne!(CAPACITY, 0, "capacity cannot be lower than 1");

            Self { arr: vec![None; CAPACITY], current_index: 0, len: 0, id_idx_map: LookupMap::new(prefix) }
        }

        pub fn len(&self) -> usize{
            self.len
        }

        pub fn is_empty(&self) -> bool{
            self.len == 0
        }

        pub fn capacity(&self) -> usize{
            CAPACITY
        }
    }

    impl<TID: BorshDeserialize + BorshSerialize + PartialEq, T: Copy + Identifier<TID>, const CAPACITY: usize> RingBuffer<TID, T> for GenericRingBuffer<T, TID, CAPACITY>{
        fn next_index(&self) -> usize{
            (self.current_index + 1) % CAPACITY
        }

        fn add(&mut self, element: &T){
            let next_idx = self.next_index();

            if let Some(replaced_element) = self.arr[self.current_index]{
                self.id_idx_map.remove(&replaced_element.id());
            } else {
                self.len += 1;
            }

            self.arr[self.current_index] = Some(*element);
            self.id_idx_map.insert(&element.id(), &self.current_index);

            self.current_index = next_idx;
        }

        fn get_by_index(&self, idx: usize) -> Option<T>{
            self.arr.get(idx).copied().flatten()
        }

        fn get_by_identifier(&self, id: &TID) -> Option<T> {
            self.id_idx_map
                .get(id)
                .and_then(|idx| self.get_by_index(idx))
                .filter(|el| el.id() == *id)
        }

        fn latest(&self, from_index: usize, limit: usize) -> Vec<T>{
            (0..self.len)
                .map(|offset| (self.current_index + CAPACITY - 1 - offset) % CAPACITY)
                .filter_map(|idx| self.get_by_index(idx))
                .skip(from_index)
                .take(limit)
                .collect()
        }
    }
}

pub mod types;

pub mod utils{
    use near_sdk::env;

    use crate::types::U256;

    /// Fixed point scale, `FIXED_POINT_SCALE` represents 100%.
    pub const FIXED_POINT_SCALE: u128 = 1_000_000_000_000_000_000;

    pub fn as_u256(arr: &[u8; 32]) -> U256{
        let mut result:U256 = U256::zero();
        let mut shift:u16 = 0;

        for byte in arr.iter(){
            result += U256::from(*byte) << shift;
            shift += 8;
        }

        result
    }

    pub fn random_u256() -> U256{
        let random_seed = env::random_seed(); // len 32
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&random_seed[..32]);

        as_u256(&seed)
    }

    /// floor(value * numerator / denominator) without intermediate overflow.
    /// Returns `None` if the denominator is zero or the result does not fit in u128.
    pub fn mul_div(value: u128, numerator: u128, denominator: u128) -> Option<u128>{
        if denominator == 0 {
            return None;
        }

        let result = U256::from(value) * U256::from(numerator) / U256::from(denominator);
        if result > U256::from(u128::MAX) {
            return None;
        }

        Some(result.as_u128())
    }
}

#[cfg(test)]
mod tests {
    use crate::generic_ring_buffer::{GenericRingBuffer, RingBuffer, Identifier};
    use crate::types::U256;
    use crate::utils::{as_u256, mul_div, FIXED_POINT_SCALE};

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Entry{
        id: u64,
        value: u32,
    }

    impl Identifier<u64> for Entry{
        fn id(&self) -> u64 {
            self.id
        }
    }

    fn entry(id: u64) -> Entry{
        Entry { id, value: id as u32 * 10 }
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = GenericRingBuffer::<Entry, u64, 5>::new(b"t".to_vec());
        assert!(buffer.is_empty());
        for idx in 0..buffer.capacity(){
            assert_eq!(buffer.get_by_index(idx), None);
        }
        assert_eq!(buffer.get_by_identifier(&1), None);
        assert!(buffer.latest(0, 10).is_empty());
    }

    #[test]
    fn test_ring_buffer() {
        let mut buffer = GenericRingBuffer::<Entry, u64, 3>::new(b"t".to_vec());
        buffer.add(&entry(1));
        buffer.add(&entry(2));
        buffer.add(&entry(3));
        buffer.add(&entry(4));

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.get_by_index(0), Some(entry(4)));
        buffer.add(&entry(5));
        assert_eq!(buffer.get_by_index(1), Some(entry(5)));
    }

    #[test]
    fn test_evicted_identifier_is_forgotten(){
        let mut buffer = GenericRingBuffer::<Entry, u64, 3>::new(b"t".to_vec());
        for id in [12, 21, 300, 100]{
            buffer.add(&entry(id));
        }

        assert_eq!(buffer.get_by_identifier(&12), None);
        assert_eq!(buffer.get_by_identifier(&21).map(|el| el.value), Some(210));
        assert_eq!(buffer.get_by_identifier(&100), Some(entry(100)));
    }

    #[test]
    fn test_latest_is_newest_first(){
        let mut buffer = GenericRingBuffer::<Entry, u64, 3>::new(b"t".to_vec());
        for id in 1..=5{
            buffer.add(&entry(id));
        }

        let ids: Vec<u64> = buffer.latest(0, 10).iter().map(|el| el.id).collect();
        assert_eq!(ids, vec![5, 4, 3]);

        let ids: Vec<u64> = buffer.latest(1, 1).iter().map(|el| el.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[test]
    fn test_as_u256_is_little_endian(){
        let mut bytes = [0u8; 32];
        bytes[0] = 1;
        assert_eq!(as_u256(&bytes), U256::one());

        bytes[1] = 1;
        assert_eq!(as_u256(&bytes), U256::from(257));
    }

    #[test]
    fn test_mul_div(){
        assert_eq!(mul_div(1000, FIXED_POINT_SCALE / 10, FIXED_POINT_SCALE), Some(100));
        assert_eq!(mul_div(u128::MAX, 2, 2), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
        assert_eq!(mul_div(5, 1, 0), None);
    }
}
